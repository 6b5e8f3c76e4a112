//! Background Tasks Module
//!
//! # Tasks
//! - Reap: removes expired cache entries once per cache interval

mod reaper;

pub use reaper::{reap_loop, start_reaper, start_reaper_on, ReapHandle, REAPER_THREAD_NAME};
