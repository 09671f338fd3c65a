pub mod host;
pub mod object;
pub mod remote;
