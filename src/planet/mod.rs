//! Control protocol for the sandboxed planet sub-scene.
//!
//! Delivery is fire-and-forget, at most once per UI event, with no
//! acknowledgment. The sub-scene applies deltas onto its own persistent
//! state, so a lost message is recovered by the next one.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum PlanetMessage {
    SetPaused(bool),
    SelectPreset(u32),
    SetFlag { name: String, value: bool },
    Orbit { d_rot_x: f32, d_rot_y: f32 },
    Pan { d_pan_x: f32, d_pan_y: f32 },
    Zoom { d_zoom: f32 },
    Sun { d_sun_x: f32, d_sun_y: f32 },
}

impl PlanetMessage {
    /// Wire encoding understood by the sub-scene.
    pub fn to_wire(&self) -> Value {
        match self {
            PlanetMessage::SetPaused(paused) => {
                json!({ "type": "planetConfig", "paused": paused })
            }
            PlanetMessage::SelectPreset(index) => {
                json!({ "type": "planetConfig", "planet": index })
            }
            PlanetMessage::SetFlag { name, value } => {
                json!({ "type": "planetConfig", "flag": name, "value": value })
            }
            PlanetMessage::Orbit { d_rot_x, d_rot_y } => {
                json!({ "type": "planetConfig", "dRotX": d_rot_x, "dRotY": d_rot_y })
            }
            PlanetMessage::Pan { d_pan_x, d_pan_y } => {
                json!({ "type": "planetConfig", "dPanX": d_pan_x, "dPanY": d_pan_y })
            }
            PlanetMessage::Zoom { d_zoom } => {
                json!({ "type": "planetConfig", "dZoom": d_zoom })
            }
            PlanetMessage::Sun { d_sun_x, d_sun_y } => {
                json!({ "type": "planetConfig", "dSunX": d_sun_x, "dSunY": d_sun_y })
            }
        }
    }
}

/// Transport to the sub-scene's rendering surface. Sends must not block
/// and must not fail loudly.
pub trait PlanetChannel: Send {
    fn send(&mut self, message: &PlanetMessage);
}

/// Lazily started link. Until a channel is attached every send is dropped,
/// which the protocol tolerates by design.
#[derive(Default)]
pub struct PlanetLink {
    channel: Option<Box<dyn PlanetChannel>>,
    started: bool,
}

impl PlanetLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, channel: Box<dyn PlanetChannel>) {
        self.channel = Some(channel);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// One-time connection establishment; later calls are no-ops. Returns
    /// whether this call started the link.
    pub fn ensure_started(&mut self) -> bool {
        if self.started || self.channel.is_none() {
            return false;
        }
        log::debug!("planet sub-scene link started");
        self.started = true;
        true
    }

    pub fn send(&mut self, message: &PlanetMessage) {
        if let Some(channel) = &mut self.channel {
            channel.send(message);
        }
    }

    pub fn pause(&mut self) {
        if self.started {
            self.send(&PlanetMessage::SetPaused(true));
        }
    }

    pub fn resume(&mut self) {
        if self.started {
            self.send(&PlanetMessage::SetPaused(false));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct Recorder(Arc<Mutex<Vec<Value>>>);

    impl PlanetChannel for Recorder {
        fn send(&mut self, message: &PlanetMessage) {
            self.0.lock().unwrap().push(message.to_wire());
        }
    }

    #[test]
    fn wire_shapes_match_the_protocol() {
        assert_eq!(
            PlanetMessage::SetPaused(true).to_wire(),
            json!({ "type": "planetConfig", "paused": true })
        );
        assert_eq!(
            PlanetMessage::SelectPreset(3).to_wire(),
            json!({ "type": "planetConfig", "planet": 3 })
        );
        assert_eq!(
            PlanetMessage::SetFlag {
                name: "clouds".to_string(),
                value: false,
            }
            .to_wire(),
            json!({ "type": "planetConfig", "flag": "clouds", "value": false })
        );
        let orbit = PlanetMessage::Orbit {
            d_rot_x: 0.5,
            d_rot_y: -0.25,
        }
        .to_wire();
        assert_eq!(orbit["type"], "planetConfig");
        assert_eq!(orbit["dRotX"], 0.5);
        assert_eq!(orbit["dRotY"], -0.25);
        assert_eq!(PlanetMessage::Zoom { d_zoom: 0.1 }.to_wire()["dZoom"], 0.1);
    }

    #[test]
    fn link_without_channel_drops_sends() {
        let mut link = PlanetLink::new();
        assert!(!link.ensure_started());
        link.send(&PlanetMessage::Zoom { d_zoom: 1.0 });
        link.pause();
        assert!(!link.is_started());
    }

    #[test]
    fn link_starts_once_and_forwards() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut link = PlanetLink::new();
        link.attach(Box::new(Recorder(sent.clone())));
        assert!(link.ensure_started());
        assert!(!link.ensure_started());
        link.resume();
        link.pause();
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["paused"], false);
        assert_eq!(sent[1]["paused"], true);
    }
}
