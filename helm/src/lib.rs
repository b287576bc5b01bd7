//! Console front end for HelmScript, a small flight-computer scripting
//! language.  Lines typed at the prompt are scanned, compiled into code
//! fragments, merged into one growing program, and executed a budgeted
//! slice at a time, so `set x to 5.` on one line and `print x.` on the
//! next behave like a single script.
//!
//! The modules follow the path a line of input travels:
//!
//! | stage | module |
//! |-------|--------|
//! | characters → tokens | [`token`], [`scanner`] |
//! | tokens → code fragments | [`compile`] |
//! | fragments → one growing program | [`program`] |
//! | instructions → output | [`value`], [`exec`] |
//! | keystrokes → submissions | [`editor`], [`history`], [`session`] |
//! | terminal and process glue | [`console`], [`config`], [`cli`] |

pub mod cli;
pub mod compile;
pub mod config;
pub mod console;
pub mod editor;
pub mod exec;
pub mod history;
pub mod program;
pub mod scanner;
pub mod session;
pub mod token;
pub mod value;
