//! # HMI Module
//!
//! Bevy plugin hosting the session. The frame loop is the single
//! coordination context: each frame advances the poller, drains the link
//! event queue into the session, then draws the egui panel. The tokio
//! runtime only runs the serial reader and writer tasks.

pub mod ui;
pub mod view;

use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use log::{error, info};
use tokio::runtime::{Builder, Runtime};

use crate::config::HmiConfig;
use crate::link::{ChannelWriter, LinkEvent, Poller, SerialLink, event_channel};
use crate::session::Session;
use ui::{PanelState, hmi_ui};
pub use view::{HmiView, LogEntry};

/// The session as a Bevy resource.
#[derive(Resource)]
pub struct HmiSession(pub Session<ChannelWriter, HmiView>);

/// Configuration the plugin was built with.
#[derive(Resource, Clone)]
pub struct HmiSettings(pub HmiConfig);

/// Keeps the serial tasks and their runtime alive. The link is dropped first.
#[derive(Resource)]
struct LinkRuntime {
    link: Option<SerialLink>,
    runtime: Option<Runtime>,
}

/// Plugin for the operator panel.
pub struct HmiPlugin {
    config: HmiConfig,
}

impl HmiPlugin {
    pub fn new(config: HmiConfig) -> Self {
        Self { config }
    }
}

impl Plugin for HmiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .insert_resource(ClearColor(Color::srgb(0.09, 0.09, 0.09)))
            .insert_resource(HmiSettings(self.config.clone()))
            .add_systems(Startup, (setup_camera_system, start_session))
            .add_systems(Update, (poll_status, pump_link_events).chain())
            .add_systems(EguiPrimaryContextPass, hmi_ui);
    }
}

fn setup_camera_system(mut commands: Commands) {
    // Basic 2D camera required for egui overlay.
    commands.spawn(Camera2d);
}

/// System: open the link and build the session.
///
/// Failures are reported through the event queue, so the panel comes up
/// either way.
fn start_session(mut commands: Commands, settings: Res<HmiSettings>) {
    let config = &settings.0;
    let (tx, rx) = event_channel();

    let runtime = match Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("plc-link")
        .enable_all()
        .build()
    {
        Ok(runtime) => Some(runtime),
        Err(e) => {
            error!("[hmi] failed to start async runtime: {e}");
            let _ = tx.send(LinkEvent::OpenError(format!("async runtime: {e}")));
            None
        }
    };

    let link = runtime.as_ref().and_then(|runtime| {
        match SerialLink::open(config, runtime.handle(), tx.clone()) {
            Ok(link) => Some(link),
            Err(e) => {
                let _ = tx.send(LinkEvent::OpenError(e.to_string()));
                None
            }
        }
    });
    let writer = link
        .as_ref()
        .map(SerialLink::writer)
        .unwrap_or_else(ChannelWriter::disconnected);

    let mut session = Session::new(config, writer, HmiView::new(config.max_log_lines), tx, rx);
    session.announce(&config.port_name);
    let poller = Poller::new(config.poll_interval());
    info!(
        "[hmi] session started on {}, polling every {:?}",
        config.port_name,
        poller.interval()
    );

    commands.insert_resource(HmiSession(session));
    commands.insert_resource(LinkRuntime { link, runtime });
    commands.insert_resource(poller);
    commands.insert_resource(PanelState::new(config));
}

/// System: issue `status` on the poll cadence.
fn poll_status(time: Res<Time>, mut poller: ResMut<Poller>, mut session: ResMut<HmiSession>) {
    if poller.tick(time.delta()) {
        session.0.dispatcher().poll_status();
    }
}

/// System: hand queued link events to the session.
fn pump_link_events(mut session: ResMut<HmiSession>) {
    session.0.pump();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Mode;
    use crate::protocol::classify_line;

    #[test]
    fn test_session_starts_without_port() {
        let mut app = App::new();
        app.insert_resource(HmiSettings(HmiConfig {
            port_name: "/nonexistent/plc-hmi-tty".to_string(),
            ..HmiConfig::default()
        }))
        .add_systems(Startup, start_session)
        .add_systems(Update, pump_link_events);

        app.update();

        let session = app.world().resource::<HmiSession>();
        let lines: Vec<_> = session.0.sink().log().map(|e| e.text.clone()).collect();
        assert_eq!(lines[0], "HMI started.");
        assert_eq!(lines[2], "Port: /nonexistent/plc-hmi-tty");
        assert!(lines.iter().any(|l| l.starts_with("[OPEN ERR]")));
        assert!(app.world().contains_resource::<Poller>());
    }

    #[test]
    fn test_status_line_reaches_view_snapshot() {
        let config = HmiConfig::default();
        let (tx, rx) = event_channel();
        let session = Session::new(
            &config,
            ChannelWriter::disconnected(),
            HmiView::new(config.max_log_lines),
            tx.clone(),
            rx,
        );
        let mut app = App::new();
        app.insert_resource(HmiSession(session))
            .add_systems(Update, pump_link_events);

        let raw = "STATUS MODE=AUTO RUN=1 SPEED=14 STEPS=42";
        tx.send(LinkEvent::Received {
            raw: raw.to_string(),
            line: classify_line(raw),
        })
        .unwrap();
        app.update();

        let session = &app.world().resource::<HmiSession>().0;
        let shown = session.sink().state();
        assert_eq!(shown, session.state());
        assert_eq!(shown.mode, Mode::Auto);
        assert!(shown.running);
        assert_eq!(shown.speed, 14);
        assert_eq!(shown.steps, 42);
        assert!(session.sink().log().any(|e| e.text == raw));
    }

    #[test]
    fn test_writes_fail_without_link() {
        let mut app = App::new();
        app.insert_resource(HmiSettings(HmiConfig {
            port_name: "/nonexistent/plc-hmi-tty".to_string(),
            ..HmiConfig::default()
        }))
        .add_systems(Startup, start_session)
        .add_systems(Update, pump_link_events);
        app.update();

        app.world_mut()
            .resource_mut::<HmiSession>()
            .0
            .dispatcher()
            .start();
        app.update();

        let session = app.world().resource::<HmiSession>();
        assert!(
            session
                .0
                .sink()
                .log()
                .any(|e| e.text == "[WRITE ERR] Failed to write to serial port: serial link is not open")
        );
    }
}
