use crate::error::Result;
use crate::schedule::{CrontabScheduler, TriggerScheduler};

pub fn schedule(hour: u8) -> Result<()> {
    CrontabScheduler::default().schedule_daily(hour)
}

pub fn unschedule() -> Result<()> {
    CrontabScheduler::default().unschedule()
}
