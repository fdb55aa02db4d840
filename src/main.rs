use bevy::log::LogPlugin;
use bevy::prelude::*;

use plc_hmi::config::{CONFIG_FILE, HmiConfig};
use plc_hmi::hmi::HmiPlugin;

fn main() -> AppExit {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = HmiConfig::load_or_default(CONFIG_FILE);

    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Mini-PLC HMI (AUTO/MANUAL)".to_string(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(HmiPlugin::new(config))
        .run()
}
