//! In-memory fakes of the core ports, shared by the unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{Clock, Endpoint, RandomSource, Transport, TransportError};

/// Replays queued responses in order and records every request it saw.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Bytes, TransportError>>>,
    requests: Mutex<Vec<(Endpoint, serde_json::Value)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Bytes::from(body.to_string())));
    }

    pub fn push_err(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn last_request(&self) -> Option<(Endpoint, serde_json::Value)> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, endpoint: &Endpoint, body: Bytes) -> Result<Bytes, TransportError> {
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        self.requests.lock().unwrap().push((endpoint.clone(), json));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".to_string())))
    }
}

/// Cycles through a fixed list of samples.
pub struct SequenceRandom {
    values: Vec<f64>,
    next: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

/// Seeded `StdRng`, for distribution tests that must not flake.
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

pub struct FixedClock {
    pub day: NaiveDate,
}

impl FixedClock {
    pub fn on(year: i32, month: u32, day: u32) -> Self {
        Self {
            day: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.day
    }

    fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.day.and_hms_opt(12, 0, 0).unwrap())
    }
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_random_is_reproducible_and_in_unit_interval() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..1_000 {
            let u = a.next_uniform();
            assert!((0.0..1.0).contains(&u));
            assert_eq!(u, b.next_uniform());
        }
    }
}
