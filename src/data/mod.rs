pub mod buffer;
pub mod capture;
pub mod io;
