// src/urgency.rs

use chrono::{Datelike, Local, NaiveDate};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

/// `1st`, `2nd`, `3rd`, `4th`, ... `11th`, `12th`, `13th`, ... `21st`.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// `13th Dec 2025`
pub fn day_label(date: NaiveDate) -> String {
    format!("{} {}", ordinal(date.day()), date.format("%b %Y"))
}

/// The bar's day label, kept current while the page stays open past midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLabel {
    date: NaiveDate,
    label: String,
}

impl DayLabel {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            label: day_label(date),
        }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns true when the day moved on.
    pub fn refresh(&mut self, date: NaiveDate) -> bool {
        if date == self.date {
            return false;
        }
        *self = Self::new(date);
        true
    }
}

/// The enrol bar's "offer ends in" timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub const ENROL_WINDOW_SECS: u32 = 15 * 60;

    pub fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    pub fn enrol_window() -> Self {
        Self::new(Self::ENROL_WINDOW_SECS)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// True on ticks that land on a whole minute.
    pub fn on_minute(&self) -> bool {
        self.remaining % 60 == 0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// One second down, stopping at zero.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    /// `mm:ss`
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    /// Tick every `period` (at least 1ms) until zero or until nobody is watching.
    pub fn spawn_ticker(self, period: Duration) -> (watch::Receiver<Countdown>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(self);
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut countdown = self;
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately
            interval.tick().await;
            while !countdown.is_expired() {
                interval.tick().await;
                countdown.tick();
                if tx.send(countdown).is_err() {
                    break;
                }
            }
        });
        (rx, handle)
    }
}
