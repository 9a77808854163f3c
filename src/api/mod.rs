// Session server: the scripting surface a debugger hook talks to.

pub mod dto;
pub mod server;
