//! Writing Gaussian input files and reading Gaussian log files

pub mod input;
pub mod logfile;

pub use input::{Gaussian, Input, Keyword, Procedure, Route};
pub use logfile::{LogError, LogFile, OptStatus, Termination};

/// from [StackOverflow](https://stackoverflow.com/a/45145246)
#[macro_export]
macro_rules! string {
    // match a list of expressions separated by comma:
    ($($str:expr),*) => ({
        // create a Vec with this list of expressions,
        // calling String::from on each:
        vec![$(String::from($str),)*] as Vec<String>
    });
}
