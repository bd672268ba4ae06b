use crate::error::EngineError;
use crate::media::{
    EngineEvent, EngineEvents, LocalStream, MediaConstraints, MediaEngine, PeerConnection,
    RemoteStream,
};
use crate::negotiation::Role;
use async_trait::async_trait;
use parley_core::IceServerConfig;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine as RtcMediaEngine};
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// [`MediaEngine`] backed by the `webrtc` crate.
///
/// There is no capture device here: `create_local_media` creates sample
/// tracks and the application feeds them through [`WebRtcEngine::local_tracks`].
pub struct WebRtcEngine {
    api: API,
    local_tracks: Mutex<Vec<Arc<TrackLocalStaticSample>>>,
}

impl WebRtcEngine {
    pub fn new() -> Result<Self, EngineError> {
        let mut media = RtcMediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self {
            api,
            local_tracks: Mutex::new(Vec::new()),
        })
    }

    pub async fn local_tracks(&self) -> Vec<Arc<TrackLocalStaticSample>> {
        self.local_tracks.lock().await.clone()
    }
}

#[async_trait]
impl MediaEngine for WebRtcEngine {
    async fn create_local_media(&self, constraints: MediaConstraints) -> Result<LocalStream, EngineError> {
        let stream_id = Uuid::new_v4().to_string();
        let mut tracks = Vec::new();

        if constraints.audio {
            tracks.push(sample_track(MIME_TYPE_OPUS, "audio", &stream_id));
        }
        if constraints.video {
            tracks.push(sample_track(MIME_TYPE_VP8, "video", &stream_id));
        }

        info!("Local stream {} created ({} tracks)", stream_id, tracks.len());
        *self.local_tracks.lock().await = tracks;

        Ok(LocalStream {
            id: stream_id,
            audio: constraints.audio,
            video: constraints.video,
        })
    }

    async fn create_peer_connection(
        &self,
        role: Role,
        ice_servers: &[IceServerConfig],
        trickle: bool,
        events: EngineEvents,
    ) -> Result<Box<dyn PeerConnection>, EngineError> {
        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(rtc_ice_server).collect(),
            ..Default::default()
        };
        let pc = Arc::new(self.api.new_peer_connection(rtc_config).await?);

        let tracks = self.local_tracks().await;
        for track in &tracks {
            pc.add_track(Arc::clone(track) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
        }
        // A receive-only caller still needs m-lines in its offer.
        if tracks.is_empty() && role == Role::Initiator {
            pc.add_transceiver_from_kind(RTPCodecType::Audio, None).await?;
            pc.add_transceiver_from_kind(RTPCodecType::Video, None).await?;
        }

        install_callbacks(&pc, trickle, &events);

        Ok(Box::new(RtcPeer { pc, trickle, events }))
    }
}

fn sample_track(mime_type: &str, kind: &str, stream_id: &str) -> Arc<TrackLocalStaticSample> {
    Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: mime_type.to_owned(),
            ..Default::default()
        },
        kind.to_owned(),
        stream_id.to_owned(),
    ))
}

fn rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn install_callbacks(pc: &Arc<RTCPeerConnection>, trickle: bool, events: &EngineEvents) {
    let state_tx = events.clone();
    pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
        let tx = state_tx.clone();
        Box::pin(async move {
            debug!("Peer connection state: {}", s);
            match s {
                RTCPeerConnectionState::Connected => {
                    let _ = tx.send(EngineEvent::Connected);
                }
                RTCPeerConnectionState::Failed => {
                    let _ = tx.send(EngineEvent::Failed("ICE connectivity failed".into()));
                }
                _ => {}
            }
        })
    }));

    if trickle {
        let ice_tx = events.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(json) = serde_json::to_value(init) else {
                    return;
                };
                let _ = tx.send(EngineEvent::LocalCandidate(json));
            })
        }));
    }

    let track_tx = events.clone();
    pc.on_track(Box::new(move |track, _receiver, _transceiver| {
        let tx = track_tx.clone();
        Box::pin(async move {
            let stream = RemoteStream {
                stream_id: track.stream_id(),
                track_id: track.id(),
                kind: track.kind().to_string(),
            };
            info!("Remote {} track {} arrived", stream.kind, stream.track_id);
            let _ = tx.send(EngineEvent::RemoteStream(stream));
        })
    }));
}

struct RtcPeer {
    pc: Arc<RTCPeerConnection>,
    trickle: bool,
    events: EngineEvents,
}

impl RtcPeer {
    /// Applies `desc` locally and emits the description to signal. Without
    /// trickle that waits for ICE gathering, so candidates ride in the SDP.
    async fn publish_local(&self, desc: RTCSessionDescription) -> Result<(), EngineError> {
        let mut gathered = self.pc.gathering_complete_promise().await;
        self.pc.set_local_description(desc).await?;

        if self.trickle {
            let local = self
                .pc
                .local_description()
                .await
                .ok_or(EngineError::MissingLocalDescription)?;
            let _ = self.events.send(EngineEvent::LocalDescription(serde_json::to_value(local)?));
            return Ok(());
        }

        let pc = Arc::clone(&self.pc);
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = gathered.recv().await;

            let event = match pc.local_description().await {
                Some(local) => match serde_json::to_value(local) {
                    Ok(json) => EngineEvent::LocalDescription(json),
                    Err(e) => EngineEvent::Failed(e.to_string()),
                },
                None => EngineEvent::Failed(EngineError::MissingLocalDescription.to_string()),
            };
            let _ = events.send(event);
        });
        Ok(())
    }
}

#[async_trait]
impl PeerConnection for RtcPeer {
    async fn create_offer(&self) -> Result<(), EngineError> {
        let offer = self.pc.create_offer(None).await?;
        self.publish_local(offer).await
    }

    async fn create_answer(&self) -> Result<(), EngineError> {
        let answer = self.pc.create_answer(None).await?;
        self.publish_local(answer).await
    }

    async fn set_remote_description(&self, sdp: Value) -> Result<(), EngineError> {
        let desc: RTCSessionDescription = serde_json::from_value(sdp)?;
        self.pc.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: Value) -> Result<(), EngineError> {
        let init: RTCIceCandidateInit = serde_json::from_value(candidate)?;
        self.pc.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        if let Err(e) = self.pc.close().await {
            warn!("Error closing peer connection: {}", e);
            return Err(e.into());
        }
        Ok(())
    }
}
