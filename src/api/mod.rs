pub mod fingerprint;
pub mod qr;
pub mod schedule;
