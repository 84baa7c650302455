//! Game lifecycle and the frame loop.
//!
//! 1. Create the component manager instance and register the game components.
//! 2. Preload textures and read the window configuration.
//! 3. Open the surface and spawn the player entity.
//! 4. Each frame: poll input, run the schedule, render, present.
//! 5. On close or frame cap: destroy the player, then the instance.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use engine_component::{ComponentManager, Entity, InstanceController};
use engine_math::Vec2;
use tracing::{debug, info, warn};

use crate::components::{ControlsComponent, MovementComponent, RenderComponent};
use crate::config::{GameConfig, VideoMode};
use crate::input::{InputEvent, InputState, ScriptedInput};
use crate::resources::ResourceManager;
use crate::schedule::{Schedule, controls_system, movement_system};
use crate::surface::{Sprite, Surface};

const PLAYER_TEXTURE: &str = "bomb_high_res";
const BACKGROUND_TEXTURE: &str = "worldBackground";
const BUTTON_TEXTURE: &str = "button";
const PLAYER_SIZE: f32 = 64.0;
const PLAYER_SPEED: f32 = 100.0;

/// Configuration for the frame loop.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Target frames per second.
    pub frame_rate: f64,
    /// Maximum number of frames to run (0 = until the window closes).
    pub max_frames: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            max_frames: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameOptions {
    pub settings_path: PathBuf,
    pub textures_dir: PathBuf,
    pub frame: FrameConfig,
}

#[derive(Debug)]
pub struct Game<S: Surface> {
    options: GameOptions,
    config: GameConfig,
    instance: InstanceController,
    resources: ResourceManager,
    surface: S,
    input: ScriptedInput,
    input_state: InputState,
    schedule: Schedule,
    player: Option<Entity>,
    background: Option<Sprite>,
    button: Option<Sprite>,
    frames: u64,
    open: bool,
}

impl<S: Surface> Game<S> {
    #[must_use]
    pub fn new(options: GameOptions, surface: S, input: ScriptedInput) -> Self {
        let mut schedule = Schedule::new();
        schedule
            .add_system("controls", controls_system)
            .add_system("movement", movement_system);

        Self {
            options,
            config: GameConfig::default(),
            instance: InstanceController::new(),
            resources: ResourceManager::new(),
            surface,
            input,
            input_state: InputState::new(),
            schedule,
            player: None,
            background: None,
            button: None,
            frames: 0,
            open: false,
        }
    }

    /// Runs the whole lifecycle and returns the number of frames played.
    /// The game is released whether or not the run succeeds.
    pub fn run(&mut self) -> Result<u64> {
        let frame_rate = self.options.frame.frame_rate;
        ensure!(
            frame_rate.is_finite() && frame_rate > 0.0,
            "frame rate must be a positive number, got {frame_rate}"
        );
        let frame_duration = Duration::try_from_secs_f64(1.0 / frame_rate)
            .with_context(|| format!("frame rate {frame_rate} is too low"))?;
        let max_frames = self.options.frame.max_frames;

        let outcome = self
            .init()
            .and_then(|()| self.frame_loop(frame_duration, max_frames));
        if let Err(err) = outcome {
            if let Err(release_err) = self.release() {
                warn!(%release_err, "release after a failed run also failed");
            }
            return Err(err);
        }

        self.release()?;
        Ok(self.frames)
    }

    fn frame_loop(&mut self, frame_duration: Duration, max_frames: u64) -> Result<()> {
        let dt = frame_duration.as_secs_f32();
        info!(
            frame_rate = 1.0 / frame_duration.as_secs_f64(),
            max_frames,
            "starting frame loop"
        );

        while self.open {
            let start = Instant::now();

            self.update(dt)?;
            self.render()?;
            self.frames += 1;

            if max_frames > 0 && self.frames >= max_frames {
                info!(frames = self.frames, "frame cap reached");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            } else {
                warn!(
                    frame = self.frames,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = frame_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
        Ok(())
    }

    /// Creates the instance, loads resources and settings, opens the
    /// surface, and spawns the player.
    pub fn init(&mut self) -> Result<()> {
        let manager = self.instance.create()?;
        manager.register::<ControlsComponent>()?;
        manager.register::<MovementComponent>()?;
        manager.register::<RenderComponent>()?;

        let textures_dir = &self.options.textures_dir;
        self.resources
            .preload_textures_from_folder(textures_dir)
            .with_context(|| format!("preloading textures from {}", textures_dir.display()))?;

        let settings_path = &self.options.settings_path;
        self.config
            .read_from_file(settings_path)
            .with_context(|| format!("reading settings from {}", settings_path.display()))?;

        let mode = if !self.config.is_fullscreen {
            self.config.windowed_mode
        } else if self.config.fullscreen_mode.is_valid() {
            self.config.fullscreen_mode
        } else {
            warn!(
                mode = ?self.config.fullscreen_mode,
                "invalid fullscreen mode, falling back to the windowed size"
            );
            self.config.windowed_mode
        };
        ensure!(mode.is_valid(), "no usable video mode, got {mode:?}");
        self.surface.open(mode.size(), self.config.is_fullscreen);

        self.background = self.optional_sprite(BACKGROUND_TEXTURE);
        self.button = self.optional_sprite(BUTTON_TEXTURE);

        let mut render = RenderComponent::new(&self.resources, PLAYER_TEXTURE)
            .context("creating the player sprite")?;
        render.set_size(Vec2::splat(PLAYER_SIZE));

        let manager = self.manager_mut()?;
        let player = manager.create_entity();
        manager.create_component(player, render)?;
        manager.create_component(player, MovementComponent::new(PLAYER_SPEED))?;
        manager.create_component(player, ControlsComponent)?;
        self.player = Some(player);

        self.open = true;
        info!(%player, width = mode.width, height = mode.height, "game initialised");
        Ok(())
    }

    /// Handles window events, then runs every system for one frame.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        for event in self.input.poll(&mut self.input_state) {
            match event {
                InputEvent::Closed => {
                    info!("window closed");
                    self.open = false;
                }
                InputEvent::Resized { width, height } => self.handle_resize(width, height),
            }
        }

        let manager = self
            .instance
            .get_mut()
            .context("component manager instance is not live")?;
        self.schedule.run(manager, &self.input_state, dt)?;
        Ok(())
    }

    /// Draws the game world into its viewport, then the window overlay.
    pub fn render(&mut self) -> Result<()> {
        self.surface.clear();

        if let Some(manager) = self.instance.get_mut() {
            let window_size = self.surface.size();
            self.surface
                .set_view(self.config.game_world_view(window_size));
            if let Some(background) = &self.background {
                self.surface.draw(background);
            }

            let surface = &mut self.surface;
            manager.for_each::<RenderComponent, _>(|_, render| {
                surface.draw(&render.sprite());
            })?;

            self.surface.set_view(self.config.window_view(window_size));
        }

        if let Some(button) = &self.button {
            self.surface.draw(button);
        }

        self.surface.display();
        Ok(())
    }

    /// Destroys the player and then the instance.
    pub fn release(&mut self) -> Result<()> {
        if let Some(player) = self.player.take()
            && let Some(manager) = self.instance.get_mut()
        {
            manager
                .destroy_entity(player)
                .context("destroying the player entity")?;
        }
        self.instance.destroy();
        self.resources.clear();
        self.open = false;
        info!(frames = self.frames, "game released");
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn manager(&self) -> Option<&ComponentManager> {
        self.instance.get()
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn manager_mut(&mut self) -> Result<&mut ComponentManager> {
        self.instance
            .get_mut()
            .context("component manager instance is not live")
    }

    fn optional_sprite(&self, texture: &str) -> Option<Sprite> {
        if self.resources.contains(texture) {
            Some(Sprite::new(texture))
        } else {
            warn!(texture, "texture not found, skipping");
            None
        }
    }

    /// A windowed resize is remembered and written back to the settings
    /// file. Fullscreen resizes are ignored.
    fn handle_resize(&mut self, width: u32, height: u32) {
        if self.config.is_fullscreen {
            debug!(width, height, "ignoring resize while fullscreen");
            return;
        }
        self.config.windowed_mode = VideoMode::new(width, height);
        self.surface.resize(self.config.windowed_mode.size());
        if let Err(err) = self.config.write_to_file(&self.options.settings_path) {
            warn!(%err, "failed to persist window size");
        }
        info!(width, height, "window resized");
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use engine_math::UVec2;
    use tempfile::TempDir;

    use super::*;
    use crate::config::Settings;
    use crate::input::{InputFrame, Key};
    use crate::surface::HeadlessSurface;

    fn assets(dir: &Path) -> PathBuf {
        let textures = dir.join("textures");
        std::fs::create_dir(&textures).unwrap();
        for file in ["bomb_high_res.png", "worldBackground.png", "button.png"] {
            std::fs::write(textures.join(file), b"").unwrap();
        }
        textures
    }

    fn game(dir: &TempDir, input: ScriptedInput, max_frames: u64) -> Game<HeadlessSurface> {
        let options = GameOptions {
            settings_path: dir.path().join("settings.json"),
            textures_dir: assets(dir.path()),
            frame: FrameConfig {
                frame_rate: 10_000.0,
                max_frames,
            },
        };
        Game::new(options, HeadlessSurface::new(), input)
    }

    #[test]
    fn test_run_until_input_closes() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new(vec![InputFrame::holding(&[Key::Right]); 4]);
        let mut game = game(&dir, input, 0);

        // Four scripted frames plus the one that reports the close.
        assert_eq!(game.run().unwrap(), 5);
        assert_eq!(game.surface().frames_presented(), 5);
        assert!(!game.is_open());
        assert!(game.manager().is_none());
    }

    #[test]
    fn test_frame_cap_stops_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = game(&dir, ScriptedInput::square(100), 3);
        assert_eq!(game.run().unwrap(), 3);
    }

    #[test]
    fn test_player_moves_with_held_key() {
        let dir = tempfile::tempdir().unwrap();
        let input = ScriptedInput::new(vec![InputFrame::holding(&[Key::Down]); 10]);
        let mut game = game(&dir, input, 0);
        game.init().unwrap();

        for _ in 0..10 {
            game.update(0.1).unwrap();
        }

        let player = game.player().unwrap();
        let render = game
            .manager()
            .unwrap()
            .get_component::<RenderComponent>(player)
            .unwrap();
        assert!((render.position - Vec2::new(0.0, 100.0)).length() < 1e-3);
        assert_eq!(render.size, Vec2::splat(PLAYER_SIZE));
    }

    #[test]
    fn test_render_draws_background_player_and_button() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = game(&dir, ScriptedInput::default(), 0);
        game.init().unwrap();
        game.render().unwrap();

        let textures: Vec<_> = game
            .surface()
            .last_frame()
            .iter()
            .map(|sprite| sprite.texture.as_str())
            .collect();
        assert_eq!(textures, [BACKGROUND_TEXTURE, PLAYER_TEXTURE, BUTTON_TEXTURE]);
    }

    #[test]
    fn test_windowed_resize_rewrites_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");
        std::fs::write(&settings_path, r#"{ "is_fullscreen": 0 }"#).unwrap();

        let resized = InputFrame::default().with_event(InputEvent::Resized {
            width: 1024,
            height: 768,
        });
        let mut game = game(&dir, ScriptedInput::new([resized]), 0);
        game.init().unwrap();
        assert_eq!(game.surface().size(), UVec2::new(800, 600));

        game.update(0.0).unwrap();

        assert_eq!(game.config().windowed_mode, VideoMode::new(1024, 768));
        assert_eq!(game.surface().size(), UVec2::new(1024, 768));
        let settings = Settings::load(&settings_path).unwrap();
        assert_eq!(settings.get_int("windowed_width").unwrap(), Some(1024));
        assert_eq!(settings.get_int("windowed_height").unwrap(), Some(768));
    }

    #[test]
    fn test_fullscreen_resize_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let resized = InputFrame::default().with_event(InputEvent::Resized {
            width: 1024,
            height: 768,
        });
        let mut game = game(&dir, ScriptedInput::new([resized]), 0);
        game.init().unwrap();
        game.update(0.0).unwrap();

        assert_eq!(game.config().windowed_mode, VideoMode::new(800, 600));
        assert!(!dir.path().join("settings.json").exists());
    }

    #[test]
    fn test_missing_texture_folder_fails_init() {
        let dir = tempfile::tempdir().unwrap();
        let options = GameOptions {
            settings_path: dir.path().join("settings.json"),
            textures_dir: dir.path().join("absent"),
            frame: FrameConfig::default(),
        };
        let mut game = Game::new(options, HeadlessSurface::new(), ScriptedInput::default());
        let err = game.init().unwrap_err();
        assert!(err.to_string().contains("preloading textures"));
    }

    #[test]
    fn test_failed_run_releases_instance() {
        let dir = tempfile::tempdir().unwrap();
        let options = GameOptions {
            settings_path: dir.path().join("settings.json"),
            textures_dir: dir.path().join("absent"),
            frame: FrameConfig {
                frame_rate: 10_000.0,
                max_frames: 0,
            },
        };
        let mut game = Game::new(options, HeadlessSurface::new(), ScriptedInput::default());

        assert!(game.run().is_err());
        assert!(game.manager().is_none());

        // The instance was released, so a second run can create it again.
        game.options.textures_dir = assets(dir.path());
        assert_eq!(game.run().unwrap(), 1);
    }

    #[test]
    fn test_render_fails_when_render_store_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = game(&dir, ScriptedInput::default(), 0);
        game.init().unwrap();

        // A fresh instance with nothing registered.
        game.instance.destroy();
        game.instance.create().unwrap();

        assert!(game.render().is_err());
    }

    #[test]
    fn test_release_destroys_player_and_instance() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = game(&dir, ScriptedInput::default(), 0);
        game.init().unwrap();
        assert_eq!(game.manager().unwrap().entity_count(), 1);

        game.release().unwrap();
        assert!(game.player().is_none());
        assert!(game.manager().is_none());
        // Releasing twice is harmless.
        game.release().unwrap();
    }

    #[test]
    fn test_zero_frame_rate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = game(&dir, ScriptedInput::default(), 0);
        game.options.frame.frame_rate = 0.0;
        assert!(game.run().is_err());
        assert!(game.manager().is_none());
    }
}
