/// Test doubles simulating the CAN controller, the indicators and the clock
/// during integration tests.
use embassy_time::Instant;
use embedded_can::StandardId;
use std::sync::{Arc, Mutex};
use twincan::{
    config::BitRate,
    core::{Message, MAX_DLC},
    driver::{
        error_handler::ErrorStatus,
        events::{EventChannel, EventSink},
        message_object::MessageObject,
        traits::{
            peripheral::CanPeripheral,
            status_panel::{Indicator, StatusPanel},
            timebase::Timebase,
        },
    },
};

use critical_section as _;

#[allow(dead_code)]
/// Depth of every simulated event channel.
pub const DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(dead_code)]
/// Frame as handed to the controller.
pub struct SentFrame {
    pub slot: u8,
    pub id: u16,
    pub dlc: u8,
    pub data: [u8; MAX_DLC],
}

#[derive(Default, Debug)]
#[allow(dead_code)]
/// Everything the controller was asked to do.
pub struct BusLog {
    pub bit_rates: Vec<BitRate>,
    pub objects: Vec<MessageObject>,
    pub enables: u32,
    pub sent: Vec<SentFrame>,
}

#[allow(dead_code)]
/// In-memory controller. Transmitted frames go to the peer's channel, or back
/// to the own channel in loopback; every transmission is confirmed.
pub struct MockPeripheral<'a> {
    own: EventSink<'a, DEPTH>,
    peer: Option<EventSink<'a, DEPTH>>,
    loopback: bool,
    log: Arc<Mutex<BusLog>>,
}

#[allow(dead_code)]
impl<'a> MockPeripheral<'a> {
    /// Controller alone on the bus.
    pub fn new(own: &'a EventChannel<DEPTH>) -> Self {
        Self {
            own: EventSink::new(own),
            peer: None,
            loopback: false,
            log: Arc::new(Mutex::new(BusLog::default())),
        }
    }

    /// Wire the controller to the peer node's event channel.
    pub fn with_peer(mut self, peer: &'a EventChannel<DEPTH>) -> Self {
        self.peer = Some(EventSink::new(peer));
        self
    }

    /// Shared handle on the call log.
    pub fn log(&self) -> Arc<Mutex<BusLog>> {
        self.log.clone()
    }
}

impl CanPeripheral for MockPeripheral<'_> {
    type Error = ();

    fn set_bit_rate(&mut self, bit_rate: BitRate) -> Result<(), Self::Error> {
        self.log.lock().unwrap().bit_rates.push(bit_rate);
        Ok(())
    }

    fn setup_object(&mut self, object: &MessageObject) -> Result<(), Self::Error> {
        self.log.lock().unwrap().objects.push(*object);
        Ok(())
    }

    fn enable(&mut self, loopback: bool) -> Result<(), Self::Error> {
        self.loopback = loopback;
        self.log.lock().unwrap().enables += 1;
        Ok(())
    }

    fn enable_interrupts(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transmit(
        &mut self,
        slot: u8,
        id: StandardId,
        dlc: u8,
        data: &[u8; MAX_DLC],
    ) -> Result<(), Self::Error> {
        self.log.lock().unwrap().sent.push(SentFrame {
            slot,
            id: id.as_raw(),
            dlc,
            data: *data,
        });

        let frame = Message::received(id, *data, dlc as usize, Instant::from_millis(0));
        if self.loopback {
            self.own.frame_received(frame);
        } else if let Some(peer) = &self.peer {
            peer.frame_received(frame);
        }
        self.own.transmit_complete(slot);
        Ok(())
    }

    fn error_status(&mut self) -> ErrorStatus {
        ErrorStatus::default()
    }
}

#[derive(Default, Debug)]
#[allow(dead_code)]
/// Status indicators recording their state and every toggle.
pub struct PanelLog {
    pub activity: bool,
    pub error: bool,
    pub activity_toggles: u32,
    pub error_toggles: u32,
}

impl StatusPanel for PanelLog {
    fn set(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::Activity => self.activity = on,
            Indicator::Error => self.error = on,
        }
    }

    fn toggle(&mut self, indicator: Indicator) {
        match indicator {
            Indicator::Activity => {
                self.activity = !self.activity;
                self.activity_toggles += 1;
            }
            Indicator::Error => {
                self.error = !self.error;
                self.error_toggles += 1;
            }
        }
    }
}

#[allow(dead_code)]
/// Clock based on `tokio::time`, so paused tests run in virtual time.
pub struct TokioTime {
    origin: tokio::time::Instant,
}

#[allow(dead_code)]
impl TokioTime {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Timebase for TokioTime {
    fn now(&self) -> Instant {
        Instant::from_micros(self.origin.elapsed().as_micros() as u64)
    }

    async fn delay_ms(&mut self, millis: u32) {
        tokio::time::sleep(tokio::time::Duration::from_millis(millis as u64)).await;
    }
}
