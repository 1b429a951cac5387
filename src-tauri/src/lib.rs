// p5-player - Live-coding p5.js VJ player
// Module declarations

pub mod assets;
pub mod config;
pub mod playback;
pub mod player;
pub mod state;
pub mod surface;

#[cfg(feature = "desktop")]
mod bridge;
#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::{Arc, Mutex};
    use tauri::{Manager, WindowEvent};

    use crate::config::{AppConfig, RENDER_WINDOW, WINDOWS};
    use crate::playback::ClickToPlay;
    use crate::player::{Player, TrackView};
    use crate::surface::{ScriptSurface, Surface};

    tauri::Builder::default()
        .setup(|app| {
            app.handle().plugin(
                tauri_plugin_log::Builder::default()
                    .level(log::LevelFilter::Info)
                    .build(),
            )?;

            let config = AppConfig::from_env().map_err(|e| {
                log::error!("Failed to resolve data directory: {}", e);
                e
            })?;
            log::info!("Data directory: {}", config.data_dir().display());

            // The app stays usable without local images
            let image_server =
                match assets::start_image_server(&config.images_dir, config.image_server_port) {
                    Ok(server) => Some(server),
                    Err(e) => {
                        log::error!("Image server not started: {}", e);
                        None
                    }
                };

            for layout in WINDOWS.iter() {
                bridge::build_window(app.handle(), layout)?;
            }

            let surface: Arc<dyn Surface> = Arc::new(ScriptSurface::new(
                bridge::WebviewSink::new(app.handle().clone()),
                config.image_server_port,
            ));
            let track_view: Arc<dyn TrackView> =
                Arc::new(bridge::TrackWindow::new(app.handle().clone()));
            let player = Player::load(&config, surface, track_view);
            player.restore_render_size();

            app.manage(commands::PlayerState(Mutex::new(player)));
            app.manage(commands::ClickState(Arc::new(ClickToPlay::default())));
            app.manage(commands::ImageServerState(Mutex::new(image_server)));
            app.manage(config);

            log::info!("p5-player initialized successfully");
            Ok(())
        })
        .on_window_event(|window, event| {
            let WindowEvent::Resized(size) = event else {
                return;
            };
            if window.label() != RENDER_WINDOW.label {
                return;
            }
            let Some(player) = window.try_state::<commands::PlayerState>() else {
                return;
            };
            let scale = window.scale_factor().unwrap_or(1.0);
            let logical = size.to_logical::<f64>(scale);
            // Held while a resize command applies the size itself
            if let Some(mut player) = player.try_lock() {
                player.record_render_size(logical.width.round() as u32, logical.height.round() as u32);
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_all_blocks,
            commands::add_block,
            commands::select_block,
            commands::update_block,
            commands::update_block_name,
            commands::get_block_by_id,
            commands::reorder_blocks,
            commands::delete_block,
            commands::load_first_block,
            commands::add_block_to_track,
            commands::get_track_blocks,
            commands::get_lanes,
            commands::save_track_blocks,
            commands::add_track_block,
            commands::remove_track_block,
            commands::move_track_block,
            commands::update_block_bars,
            commands::retime_track,
            commands::update_bpm,
            commands::update_delay,
            commands::get_render_size,
            commands::update_render_size,
            commands::play_lanes,
            commands::update_single_lane,
            commands::clear_all_lanes,
            commands::clear_lane,
            commands::clear_single_preview,
            commands::toggle_playback,
            commands::stop_playback,
            commands::is_playing,
            commands::set_click_to_play,
            commands::get_click_to_play,
            commands::render_clicked,
            commands::hide_all_windows,
            commands::show_all_windows,
            commands::get_image_server_url,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
