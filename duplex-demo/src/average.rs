//! Client-streaming call: the client sends numbers, the server responds
//! with their average once the client half-closes the call.
//!
//! The server handler is a two-stage machine. `accumulate` loops while numbers
//! arrive and leaves on end of input, `respond` sends the only response.

use std::time::Duration;

use async_trait::async_trait;
use duplex_machine::{Control, Machine};
use duplex_rpc::{channel::Channel, request::ServerCall, server::Handler};
use log::info;
use serde::{Deserialize, Serialize};

pub const METHOD: &str = "average.AverageService/CalculateAverage";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NumberMessage {
    pub number: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AverageResponse {
    pub average: f64,
}

/// Running sum and count
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Accumulator {
    sum: i64,
    count: i64,
}

impl Accumulator {
    pub fn push(&mut self, number: i32) {
        self.sum += i64::from(number);
        self.count += 1;
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// `0` for an empty input
    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum as f64 / self.count as f64
        } else {
            0.0
        }
    }
}

impl FromIterator<i32> for Accumulator {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut accumulator = Self::default();
        iter.into_iter().for_each(|number| accumulator.push(number));
        accumulator
    }
}

struct AverageSession {
    call: ServerCall,
    accumulator: Accumulator,
}

async fn accumulate(
    mut session: AverageSession,
) -> Control<AverageSession, duplex_rpc::Result<AverageSession>> {
    match session.call.recv::<NumberMessage>().await {
        Ok(Some(message)) => {
            session.accumulator.push(message.number);
            info!(
                "Received: {} (sum={}, count={})",
                message.number,
                session.accumulator.sum(),
                session.accumulator.count()
            );

            Control::Loop(session)
        }
        Ok(None) => Control::Return(Ok(session)),
        Err(e) => Control::Return(Err(e)),
    }
}

async fn respond(
    session: duplex_rpc::Result<AverageSession>,
) -> Control<duplex_rpc::Result<AverageSession>, duplex_rpc::Result<()>> {
    let session = match session {
        Ok(session) => session,
        Err(e) => return Control::Return(Err(e)),
    };

    let accumulator = session.accumulator;
    let average = accumulator.average();
    info!(
        "Calculated average: {} / {} = {average:.2}",
        accumulator.sum(),
        accumulator.count()
    );

    Control::Return(session.call.send(&AverageResponse { average }).await)
}

pub struct AverageService;

#[async_trait]
impl Handler for AverageService {
    async fn handle(&self, call: ServerCall) -> duplex_rpc::Result<()> {
        info!("Client started streaming numbers");

        Machine::init(AverageSession {
            call,
            accumulator: Accumulator::default(),
        })
        .then(accumulate)
        .then(respond)
        .await
    }
}

/// Stream `numbers` with `pacing` in between and wait for the average
pub async fn calculate_average(
    channel: &Channel,
    numbers: &[i32],
    pacing: Duration,
    deadline: Duration,
) -> duplex_rpc::Result<f64> {
    let mut call = channel.open_call(METHOD, deadline).await?;

    info!("Sending numbers...");
    for &number in numbers {
        call.send(&NumberMessage { number }).await?;
        info!("Sent: {number}");

        tokio::time::sleep(pacing).await;
    }

    let response: AverageResponse = call.finish().await?;
    info!("Average: {:.2}", response.average);

    Ok(response.average)
}
