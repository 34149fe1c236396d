pub mod changes;
pub mod comments;
pub mod config;
pub mod coverage;
pub mod diff;
pub mod error;
pub mod github;
pub mod html;
pub mod model;
pub mod parsers;
pub mod report;
pub mod run;
pub mod tabulate;
