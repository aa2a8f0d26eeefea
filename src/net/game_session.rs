//! Client session - owns the world view and dispatches server events
//!
//! One `ClientSession` lives per connection. Server events are queued by the
//! reader task and applied at the start of the next frame; intents produced by
//! handlers and input go to the outbound queue and are written by the session
//! loop after every step.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::{self, ChatSink, Notice};
use crate::config::ClientConfig;
use crate::game::camera::Camera;
use crate::game::constants::assets;
use crate::game::input::DirectionMachine;
use crate::game::store::{UpdateOutcome, WorldStore};
use crate::host::HostParts;
use crate::metrics::ClientMetrics;
use crate::net::event_buffer::{InboundBuffer, InboundSender, OutboundQueue};
use crate::net::protocol::{
    self, ChatLine, ClientIntent, Handshake, Hello, PlayerSettings, ScreenSize, ServerEvent,
};
use crate::net::session::{Lifecycle, SessionPhase};
use crate::render::audio::AudioSink;
use crate::render::pipeline::{FrameStats, RenderPipeline};
use crate::render::registry::ReferenceRegistry;
use crate::util::vec2::Vec2;

pub struct ClientSession {
    config: ClientConfig,
    store: WorldStore,
    input: DirectionMachine,
    lifecycle: Lifecycle,
    pipeline: RenderPipeline,
    inbound: InboundBuffer,
    outbound: OutboundQueue,
    metrics: Arc<ClientMetrics>,
    /// Last window size reported by the front end
    window: Vec2,
    settings: Option<PlayerSettings>,
    rooms: Vec<String>,
    ping_sent_at_ms: Option<u64>,
}

impl ClientSession {
    pub fn new(config: ClientConfig, registry: ReferenceRegistry, metrics: Arc<ClientMetrics>) -> Self {
        let window = Vec2::new(config.screen_width as f32, config.screen_height as f32);
        let mut store = WorldStore::new();
        store.set_screen(window.x, window.y);

        Self {
            input: DirectionMachine::new(config.continuity),
            pipeline: RenderPipeline::new(registry, config.draw_border),
            inbound: InboundBuffer::new(config.inbound_capacity),
            outbound: OutboundQueue::new(config.outbound_capacity),
            lifecycle: Lifecycle::new(),
            store,
            metrics,
            window,
            settings: None,
            rooms: Vec::new(),
            ping_sent_at_ms: None,
            config,
        }
    }

    // ----- accessors -----

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    pub fn input(&self) -> &DirectionMachine {
        &self.input
    }

    pub fn phase(&self) -> &SessionPhase {
        self.lifecycle.phase()
    }

    pub fn connection_id(&self) -> Uuid {
        self.lifecycle.connection_id()
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Settings from the last `welcome`
    pub fn player_settings(&self) -> Option<&PlayerSettings> {
        self.settings.as_ref()
    }

    /// Current viewport (world surface size)
    pub fn viewport(&self) -> Vec2 {
        self.store.local().screen
    }

    /// Sender handle for the transport reader
    pub fn inbound_sender(&self) -> InboundSender {
        self.inbound.sender()
    }

    /// Queue a server event as if it came off the wire
    pub fn submit(&self, event: ServerEvent) -> bool {
        self.inbound.try_submit(event)
    }

    /// Take every intent waiting to be written
    pub fn drain_outbound(&self) -> Vec<ClientIntent> {
        self.outbound.drain()
    }

    // ----- connection -----

    /// Fresh connection: forget the previous world and open the handshake
    pub fn begin(&mut self) {
        self.lifecycle.reset();
        self.store.reset();
        self.input.reset();
        self.pipeline.clear();
        self.settings = None;
        self.ping_sent_at_ms = None;
        let stale = self.outbound.clear();
        if stale > 0 {
            debug!("Discarded {} stale intents", stale);
        }

        info!(
            "Connecting as {:?} (conn {})",
            self.config.player_kind,
            self.lifecycle.connection_id()
        );
        self.send(ClientIntent::Hello(Hello {
            kind: self.config.player_kind,
        }));
        self.send(ClientIntent::RequestRooms);
        self.send(ClientIntent::Respawn);
    }

    /// Transport failed underneath us
    pub fn transport_lost(&mut self, now_ms: u64) {
        if self.lifecycle.disconnected(now_ms) {
            info!("Connection lost (conn {})", self.lifecycle.connection_id());
            self.teardown();
        }
    }

    /// Queue an intent; nothing goes out once the round is over
    fn send(&mut self, intent: ClientIntent) -> bool {
        if self.lifecycle.phase().is_terminal() {
            return false;
        }
        match self.outbound.push(intent) {
            Ok(()) => true,
            Err(e) => {
                debug!("Outbound intent dropped: {}", e);
                ClientMetrics::add(&self.metrics.dropped_intents, 1);
                false
            }
        }
    }

    fn teardown(&mut self) {
        self.input.reset();
        self.store.clear_transient();
        self.pipeline.clear();
    }

    // ----- dispatch -----

    /// Apply one server event
    pub fn handle_event(
        &mut self,
        event: ServerEvent,
        now_ms: u64,
        audio: &mut dyn AudioSink,
        chat: &mut dyn ChatSink,
    ) {
        match event {
            ServerEvent::Welcome(settings) => {
                self.store.close_initial_burst();
                self.on_welcome(settings, audio, chat)
            }
            ServerEvent::GameSetup(setup) => {
                self.store.close_initial_burst();
                self.store.set_world_size(setup.game_width, setup.game_height);
                self.resize(self.window.x, self.window.y);
            }
            ServerEvent::Initial(payload) => match protocol::initial_records(payload) {
                Ok(records) => self.store.apply_initial(records),
                Err(e) => self.ignore(&e),
            },
            ServerEvent::Update(payload) => match protocol::incremental_update(payload) {
                Ok(update) => match self.store.apply_incremental_update(update) {
                    UpdateOutcome::Applied => {}
                    UpdateOutcome::PartiallyApplied { .. }
                    | UpdateOutcome::UnknownEntity
                    | UpdateOutcome::Unhandled => {
                        ClientMetrics::add(&self.metrics.ignored_updates, 1);
                    }
                },
                Err(e) => self.ignore(&e),
            },
            ServerEvent::UpdateTanks(list) => match protocol::tank_list(list) {
                Ok(tanks) => self.store.replace_tanks(tanks),
                Err(e) => self.ignore(&e),
            },
            ServerEvent::UpdateBullets(bullets) => self.store.replace_bullets(bullets),
            ServerEvent::UpdateExplosions(explosions) => self.store.replace_explosions(explosions),
            ServerEvent::Trajectory(trajectory) => self.store.replace_trajectory(trajectory),
            ServerEvent::TurnsEnabled(t) => self.store.set_turns_enabled(t.turns_enabled),
            ServerEvent::NextTurn(turn) => self.store.set_current_player(turn.current_player),
            ServerEvent::Rip => {
                if self.lifecycle.died(now_ms) {
                    info!("Local tank destroyed");
                    self.teardown();
                }
                self.store.clear_planets();
            }
            ServerEvent::RoomClose => {
                if self.lifecycle.room_closed(now_ms) {
                    info!("Room is closing");
                    self.teardown();
                }
                self.store.clear_planets();
            }
            ServerEvent::Disconnect | ServerEvent::ConnectFailed => self.transport_lost(now_ms),
            ServerEvent::Kick(reason) => {
                let reason = reason.unwrap_or_default();
                if self.lifecycle.kicked(reason.clone(), now_ms) {
                    info!("Kicked from the room: '{}'", reason);
                    self.teardown();
                }
            }
            ServerEvent::PlayerDied(p) => chat.add_system_line(&chat::notice_line(Notice::Died, &p.name)),
            ServerEvent::PlayerJoin(p) => chat.add_system_line(&chat::notice_line(Notice::Joined, &p.name)),
            ServerEvent::PlayerDisconnect(p) => {
                chat.add_system_line(&chat::notice_line(Notice::Disconnected, &p.name))
            }
            ServerEvent::ServerMessage(line) => chat.add_system_line(&line),
            ServerEvent::PlayerChat(line) => chat.add_chat_line(&line.sender, &line.message),
            ServerEvent::PongCheck => match self.ping_sent_at_ms.take() {
                Some(sent) => {
                    let latency = now_ms.saturating_sub(sent);
                    debug!("Latency: {}ms", latency);
                    chat.add_system_line(&chat::ping_line(latency));
                }
                None => debug!("Unsolicited pongcheck"),
            },
            ServerEvent::RoomList(rooms) => {
                debug!("{} rooms open", rooms.len());
                self.rooms = rooms;
            }
        }
    }

    fn ignore(&self, error: &protocol::ProtocolError) {
        warn!("Ignoring malformed payload: {}", error);
        ClientMetrics::add(&self.metrics.ignored_updates, 1);
    }

    fn on_welcome(
        &mut self,
        settings: PlayerSettings,
        audio: &mut dyn AudioSink,
        chat: &mut dyn ChatSink,
    ) {
        info!("Welcome: player id {}", settings.id);
        self.store
            .set_local_player(Some(settings.id.clone()), self.config.player_name.clone());

        let screen = self.viewport();
        let room = self
            .config
            .room_name
            .clone()
            .or_else(|| self.rooms.first().cloned());
        let handshake = Handshake::new(
            &settings,
            self.config.player_name.clone(),
            ScreenSize {
                screen_width: screen.x,
                screen_height: screen.y,
            },
            self.input.target().into(),
            room,
        );
        self.settings = Some(settings);
        self.send(ClientIntent::Gotit(Box::new(handshake)));
        self.lifecycle.start();

        for line in chat::CONNECTED_LINES {
            chat.add_system_line(line);
        }

        audio.stop_all();
        match self.pipeline.registry().sound(assets::GAME_MUSIC) {
            Some(music) => audio.play_looped(music),
            None => ClientMetrics::add(&self.metrics.registry_misses, 1),
        }
    }

    // ----- frame -----

    /// Apply queued events, advance the lifecycle and paint one frame
    pub fn frame(&mut self, now_ms: u64, parts: HostParts<'_>) -> FrameStats {
        let HostParts {
            surfaces,
            audio,
            chat,
        } = parts;

        for event in self.inbound.drain() {
            self.handle_event(event, now_ms, audio, chat);
        }

        if self.lifecycle.poll(now_ms) {
            info!("Returned to menu");
        }

        let stats = self
            .pipeline
            .render_frame(&mut self.store, self.lifecycle.phase(), surfaces, audio, now_ms);
        ClientMetrics::add(&self.metrics.registry_misses, stats.registry_misses);

        if stats.heartbeat_due && self.lifecycle.phase().is_alive() {
            self.send(ClientIntent::heartbeat(self.input.target()));
        }
        stats
    }

    /// Held-direction loop: one continuous command per held key
    pub fn direction_tick(&mut self) {
        if !self.lifecycle.phase().is_alive() {
            return;
        }
        let intents: Vec<ClientIntent> = self.input.tick_held().collect();
        for intent in intents {
            self.send(intent);
        }
    }

    // ----- input -----

    pub fn key_down(&mut self, code: u32) {
        if let Some(intent) = self.input.key_down(code) {
            self.send(intent);
        }
    }

    pub fn key_up(&mut self, code: u32) {
        if let Some(intent) = self.input.key_up(code) {
            self.send(intent);
        }
    }

    pub fn blur(&mut self) {
        if let Some(intent) = self.input.blur() {
            self.send(intent);
        }
    }

    pub fn pointer_moved(&mut self, screen: Vec2) {
        let camera = Camera::from_store(&self.store);
        self.input.pointer_moved(screen, &camera);
    }

    pub fn touch_moved(&mut self, screen: Vec2) {
        let viewport = self.viewport();
        self.input.touch_moved(screen, viewport);
    }

    pub fn pointer_left(&mut self) {
        self.input.pointer_left();
    }

    pub fn click(&mut self) {
        let intent = self.input.click();
        self.send(intent);
    }

    /// Window size changed
    ///
    /// Spectators always see the whole world, centred on it.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.window = Vec2::new(width, height);
        let world = self.store.world_size();
        let viewport = if self.config.player_kind.is_spectator() && world.x > 0.0 && world.y > 0.0 {
            self.store.set_local_position(world * 0.5);
            world
        } else {
            self.window
        };

        self.store.set_screen(viewport.x, viewport.y);
        self.send(ClientIntent::WindowResized(ScreenSize {
            screen_width: viewport.x,
            screen_height: viewport.y,
        }));
    }

    // ----- chat -----

    pub fn ping(&mut self, now_ms: u64) {
        if self.send(ClientIntent::PingCheck) {
            self.ping_sent_at_ms = Some(now_ms);
        }
    }

    pub fn send_chat(&mut self, message: impl Into<String>) {
        let sender = chat::display_name(&self.config.player_name).to_string();
        self.send(ClientIntent::PlayerChat(ChatLine {
            sender,
            message: message.into(),
        }));
    }
}

#[cfg(feature = "transport")]
pub use self::run_loop::run;

#[cfg(feature = "transport")]
mod run_loop {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncRead, AsyncWrite};
    use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

    use crate::game::constants::timing::STATS_LOG_INTERVAL_SECS;
    use crate::host::Host;
    use crate::net::transport;

    /// Drive a session over `stream` until it returns to the menu
    pub async fn run<S, H>(mut session: ClientSession, stream: S, host: &mut H) -> anyhow::Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        H: Host,
    {
        let metrics = session.metrics().clone();
        let (reader, mut writer) = tokio::io::split(stream);
        let reader_task = transport::spawn_reader(reader, session.inbound_sender(), metrics.clone());

        let start = Instant::now();
        let now_ms = |start: Instant| start.elapsed().as_millis() as u64;

        session.begin();
        let mut viewport = session.viewport();
        host.resize(viewport);

        let mut frame_ticker = interval(session.config().frame_interval());
        frame_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut direction_ticker = interval(session.config().direction_interval());
        direction_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let stats_period = Duration::from_secs(STATS_LOG_INTERVAL_SECS);
        let mut stats_ticker = interval_at(start + stats_period, stats_period);

        info!(
            "Session loop started at {} Hz (conn {})",
            session.config().frame_rate_hz,
            session.connection_id()
        );

        loop {
            tokio::select! {
                _ = frame_ticker.tick() => {
                    let began = Instant::now();
                    session.frame(now_ms(start), host.parts());
                    host.present();
                    metrics.record_frame_time(began.elapsed());

                    if session.viewport() != viewport {
                        viewport = session.viewport();
                        host.resize(viewport);
                    }
                }
                _ = direction_ticker.tick() => {
                    session.direction_tick();
                }
                _ = stats_ticker.tick() => {
                    info!(
                        "Session {}s, phase {} | {}",
                        start.elapsed().as_secs(),
                        session.phase(),
                        metrics.summary()
                    );
                    session.ping(now_ms(start));
                }
            }

            let pending = session.drain_outbound();
            if let Err(e) = transport::write_intents(&mut writer, &pending, &metrics).await {
                warn!("Write failed: {}", e);
                session.transport_lost(now_ms(start));
            }

            if matches!(session.phase(), SessionPhase::Menu) {
                break;
            }
        }

        reader_task.abort();
        info!("Session ended ({})", metrics.summary());
        Ok(())
    }
}
