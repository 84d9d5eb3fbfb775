pub mod expiry_sweep_job;

pub use expiry_sweep_job::ExpirySweepJob;
