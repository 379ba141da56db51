//! Keyboard control surface.
//!
//! Reads the current values through [`SceneComposer::settings`] and writes
//! only through the composer's setters, which clamp to the control ranges.

use orrery_scene::{ReloadSummary, SceneComposer};
use tracing::{info, warn};
use winit::keyboard::KeyCode;

const RESOLUTION_STEP: f32 = 0.1;
const BLOOM_STRENGTH_STEP: f32 = 0.05;
const BLOOM_THRESHOLD_STEP: f32 = 0.01;
const BLOOM_RADIUS_STEP: f32 = 0.01;
const NEBULA_INTENSITY_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    ToggleNebula,
    ToggleAsteroids,
    ToggleTrails,
    ToggleExoplanets,
    AdjustResolution(f32),
    AdjustBloomStrength(f32),
    AdjustBloomThreshold(f32),
    AdjustBloomRadius(f32),
    AdjustNebulaIntensity(f32),
    ReloadData,
    Quit,
}

/// What the window should do after an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Handled,
    Reload,
    Quit,
}

pub fn action_for_key(key: KeyCode) -> Option<ControlAction> {
    use ControlAction::*;
    let action = match key {
        KeyCode::KeyN => ToggleNebula,
        KeyCode::KeyA => ToggleAsteroids,
        KeyCode::KeyT => ToggleTrails,
        KeyCode::KeyE => ToggleExoplanets,
        KeyCode::BracketLeft => AdjustResolution(-RESOLUTION_STEP),
        KeyCode::BracketRight => AdjustResolution(RESOLUTION_STEP),
        KeyCode::Minus => AdjustBloomStrength(-BLOOM_STRENGTH_STEP),
        KeyCode::Equal => AdjustBloomStrength(BLOOM_STRENGTH_STEP),
        KeyCode::Comma => AdjustBloomThreshold(-BLOOM_THRESHOLD_STEP),
        KeyCode::Period => AdjustBloomThreshold(BLOOM_THRESHOLD_STEP),
        KeyCode::Semicolon => AdjustBloomRadius(-BLOOM_RADIUS_STEP),
        KeyCode::Quote => AdjustBloomRadius(BLOOM_RADIUS_STEP),
        KeyCode::Digit9 => AdjustNebulaIntensity(-NEBULA_INTENSITY_STEP),
        KeyCode::Digit0 => AdjustNebulaIntensity(NEBULA_INTENSITY_STEP),
        KeyCode::KeyL => ReloadData,
        KeyCode::Escape => Quit,
        _ => return None,
    };
    Some(action)
}

pub fn apply(action: ControlAction, scene: &mut SceneComposer) -> ControlOutcome {
    let settings = scene.settings().clone();
    match action {
        ControlAction::ToggleNebula => scene.set_nebula_visibility(!settings.nebula_visible),
        ControlAction::ToggleAsteroids => {
            scene.set_asteroid_visibility(!settings.asteroids_visible)
        }
        ControlAction::ToggleTrails => scene.set_orbit_trails_visibility(!settings.planet_trails),
        ControlAction::ToggleExoplanets => {
            scene.set_exoplanet_visibility(!settings.exoplanets_visible)
        }
        ControlAction::AdjustResolution(step) => {
            scene.set_resolution_multiplier(settings.resolution_multiplier + step)
        }
        ControlAction::AdjustBloomStrength(step) => {
            scene.set_bloom_strength(settings.bloom_strength + step)
        }
        ControlAction::AdjustBloomThreshold(step) => {
            scene.set_bloom_threshold(settings.bloom_threshold + step)
        }
        ControlAction::AdjustBloomRadius(step) => {
            scene.set_bloom_radius(settings.bloom_radius + step)
        }
        ControlAction::AdjustNebulaIntensity(step) => {
            scene.set_nebula_intensity(settings.nebula_intensity + step)
        }
        ControlAction::ReloadData => return ControlOutcome::Reload,
        ControlAction::Quit => return ControlOutcome::Quit,
    }
    info!(?action, settings = ?scene.settings(), "setting changed");
    ControlOutcome::Handled
}

/// Log the outcome of a finished exoplanet reload.
pub fn report_reload(summary: &ReloadSummary) -> String {
    let message = format!("loaded {} planets (source: {})", summary.count, summary.source);
    if summary.count == 0 {
        warn!("{message}");
    } else {
        info!("{message}");
    }
    message
}
