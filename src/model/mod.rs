pub mod attendance;
pub mod fingerprint;
pub mod qr;
pub mod schedule;
pub mod teacher;
pub mod user;
