//! Native shell: tao window, wry control webview, and wry-backed page
//! sessions for content surfaces.

pub mod shell;

pub use shell::run;
