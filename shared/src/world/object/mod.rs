pub mod class_kinds;
pub mod dirty_mask;
pub mod dirty_receiver;
pub mod ghost;
pub mod net_object;
pub mod replicate;
