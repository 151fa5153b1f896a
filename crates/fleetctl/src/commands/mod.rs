pub mod evaluate;
pub mod validate;
pub mod watch;
