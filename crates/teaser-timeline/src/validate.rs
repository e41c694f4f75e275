use crate::choreography::{Anchor, Choreography, ElementRecipe, SceneLayout};
use crate::composition::CompositionSpec;
use teaser_core::TeaserError;

/// Validate a choreography against the composition it will drive.
pub fn validate_choreography(
    choreography: &Choreography,
    spec: &CompositionSpec,
) -> Result<(), Vec<TeaserError>> {
    let mut errors = Vec::new();

    if let Err(e) = spec.validate() {
        errors.push(e);
    }

    let total_secs = spec.duration().as_seconds();

    for (name, recipe) in [
        ("image", &choreography.image),
        ("title", &choreography.title),
        ("description", &choreography.description),
    ] {
        validate_recipe(name, recipe, &mut errors);
    }

    match choreography.layout {
        SceneLayout::SingleScene => {
            if choreography.font_transition.is_some() {
                errors.push(TeaserError::Composition(
                    "font transition requires a two-scene layout".into(),
                ));
            }
        }
        SceneLayout::TwoScene { first_scene } => {
            let secs = first_scene.as_seconds();
            if secs <= 0.0 || secs >= total_secs {
                errors.push(TeaserError::Composition(format!(
                    "scene boundary at {} must lie inside the composition ({})",
                    first_scene,
                    spec.duration()
                )));
            }
        }
    }

    if let Some(transition) = &choreography.font_transition {
        if transition.window.as_seconds() <= 0.0 {
            errors.push(TeaserError::Composition(
                "font transition window must be positive".into(),
            ));
        }
        if transition.hero.title <= 0.0 || transition.hero.description <= 0.0 {
            errors.push(TeaserError::Composition(
                "hero font sizes must be positive".into(),
            ));
        }
    }

    let fonts = choreography.standard_fonts;
    if fonts.title <= 0.0 || fonts.description <= 0.0 {
        errors.push(TeaserError::Composition(
            "standard font sizes must be positive".into(),
        ));
    }

    let fade = choreography.end_fade.as_seconds();
    if fade <= 0.0 || fade > total_secs {
        errors.push(TeaserError::Composition(format!(
            "end fade of {} does not fit in the composition ({})",
            choreography.end_fade,
            spec.duration()
        )));
    }

    // The description may never appear before the title.
    let fps = spec.fps_f64();
    let boundary = match choreography.layout {
        SceneLayout::SingleScene => 0,
        SceneLayout::TwoScene { first_scene } => first_scene.to_frame_offset(fps),
    };
    if choreography.title.trigger.anchor == Anchor::Title {
        errors.push(TeaserError::Composition(
            "title trigger cannot be anchored to the title".into(),
        ));
    }
    let title_start = choreography.title.trigger.resolve(boundary, 0, fps);
    if choreography.description.trigger.resolve(boundary, title_start, fps) < title_start {
        errors.push(TeaserError::Composition(
            "description is triggered before the title".into(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_recipe(name: &str, recipe: &ElementRecipe, errors: &mut Vec<TeaserError>) {
    for track in recipe.tracks() {
        if track.duration.as_seconds() <= 0.0 {
            errors.push(TeaserError::Composition(format!(
                "{} has a track with non-positive duration",
                name
            )));
        }
        if !track.from.is_finite() || !track.to.is_finite() {
            errors.push(TeaserError::Composition(format!(
                "{} has a track with a non-finite value",
                name
            )));
        }
    }
    if let Some(cps) = recipe.stream_cps {
        if !(cps.is_finite() && cps > 0.0) {
            errors.push(TeaserError::Composition(format!(
                "{} streams at {} chars/s, must be positive",
                name, cps
            )));
        }
    }
}
