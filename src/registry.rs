//! Builtin relationship verbs.
//!
//! Every cell of the relationship matrix resolves to a callable; when no
//! custom script overrides it, the verb label is canonicalized and looked up
//! here. Canonicalization is intentionally lossy: the matrix vocabulary is
//! richer than the set of distinct mechanical effects, so several labels
//! collapse onto one entry (e.g. both `Aspires To` cells share `aspiresto`).
//!
//! Each builtin pairs a console message with a tagged [`Effect`] value, so
//! the mechanical behaviors live in one small interpreter instead of eighty
//! ad-hoc closures.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::OnceLock;

use glam::{Quat, Vec3};

use crate::scene::{SceneApi, SceneObject, Transform};

/// Qualifying words stripped when an exact canonical lookup misses.
const FILLER_WORDS: &[&str] = &["deep", "perfected"];

/// Lowercase a verb label and drop whitespace/punctuation, yielding the
/// registry key. `Fine-tunes` → `finetunes`, `Is Realized by` →
/// `isrealizedby`.
pub fn canonicalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn strip_fillers(canonical: &str) -> String {
    let mut out = canonical.to_string();
    for filler in FILLER_WORDS {
        out = out.replace(filler, "");
    }
    out
}

/// Numeric parameter edits used by builtins that refine primitive geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamOp {
    Scale(f32),
    Increment { step: f32, max: f32 },
    Round,
}

impl ParamOp {
    fn apply(&self, value: f32) -> f32 {
        match self {
            ParamOp::Scale(factor) => value * factor,
            ParamOp::Increment { step, max } => (value + step).min(*max),
            ParamOp::Round => value.round(),
        }
    }
}

/// The mechanical half of a builtin verb.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The console message is the whole action.
    Log,
    /// Log an extra line (supports `{key}` substitution).
    Note(&'static str),
    Translate(Vec3),
    SetPosition(Vec3),
    /// Lerp position toward the origin on the horizontal plane, keeping
    /// height.
    ApproachOrigin { t: f32 },
    /// Round each position axis to the nearest multiple of the step.
    SnapToGrid(f32),
    /// Drop to the base plane (y = 0).
    FlattenToGround,
    ScaleUniform(f32),
    ScaleAxes(Vec3),
    SetScale(Vec3),
    RotateAxisAngle { axis: Vec3, angle: f32 },
    RotateEuler(Vec3),
    SetRotationEuler(Vec3),
    SlerpToIdentity(f32),
    ResetRotation,
    ResetTransform,
    /// Scale to `factors` times the current scale, restoring the original
    /// after `seconds` via a deferred mutation.
    Pulse { factors: Vec3, seconds: f32 },
    /// Random position offset of up to ±magnitude/2 on each axis.
    Jitter(f32),
    /// Random per-axis growth in `[1, 1 + max)`.
    GrowRandom(f32),
    /// Edit one primitive parameter if present, otherwise fall back.
    ParamEdit {
        field: &'static str,
        op: ParamOp,
        fallback: Option<Box<Effect>>,
    },
    Seq(Vec<Effect>),
}

impl Effect {
    pub fn apply(&self, key: &str, api: &dyn SceneApi) -> Result<(), String> {
        match self {
            Effect::Log => Ok(()),
            Effect::Note(text) => {
                api.log(&text.replace("{key}", key));
                Ok(())
            }
            Effect::Translate(delta) => {
                let delta = *delta;
                api.update_transform(key, &move |mut t| {
                    t.position += delta;
                    t
                });
                Ok(())
            }
            Effect::SetPosition(position) => {
                let position = *position;
                api.update_transform(key, &move |mut t| {
                    t.position = position;
                    t
                });
                Ok(())
            }
            Effect::ApproachOrigin { t: factor } => {
                let factor = *factor;
                api.update_transform(key, &move |mut t| {
                    t.position.x *= 1.0 - factor;
                    t.position.z *= 1.0 - factor;
                    t
                });
                Ok(())
            }
            Effect::SnapToGrid(step) => {
                let step = *step;
                api.update_transform(key, &move |mut t| {
                    t.position = (t.position / step).round() * step;
                    t
                });
                Ok(())
            }
            Effect::FlattenToGround => {
                api.update_transform(key, &|mut t| {
                    t.position.y = 0.0;
                    t
                });
                Ok(())
            }
            Effect::ScaleUniform(factor) => {
                let factor = *factor;
                api.update_transform(key, &move |mut t| {
                    t.scale *= factor;
                    t
                });
                Ok(())
            }
            Effect::ScaleAxes(factors) => {
                let factors = *factors;
                api.update_transform(key, &move |mut t| {
                    t.scale *= factors;
                    t
                });
                Ok(())
            }
            Effect::SetScale(scale) => {
                let scale = *scale;
                api.update_transform(key, &move |mut t| {
                    t.scale = scale;
                    t
                });
                Ok(())
            }
            Effect::RotateAxisAngle { axis, angle } => {
                let delta = Quat::from_axis_angle(axis.normalize(), *angle);
                api.update_transform(key, &move |mut t| {
                    t.rotation *= delta;
                    t
                });
                Ok(())
            }
            Effect::RotateEuler(angles) => {
                let delta = Quat::from_euler(glam::EulerRot::XYZ, angles.x, angles.y, angles.z);
                api.update_transform(key, &move |mut t| {
                    t.rotation *= delta;
                    t
                });
                Ok(())
            }
            Effect::SetRotationEuler(angles) => {
                let rotation = Quat::from_euler(glam::EulerRot::XYZ, angles.x, angles.y, angles.z);
                api.update_transform(key, &move |mut t| {
                    t.rotation = rotation;
                    t
                });
                Ok(())
            }
            Effect::SlerpToIdentity(factor) => {
                let factor = *factor;
                api.update_transform(key, &move |mut t| {
                    t.rotation = t.rotation.slerp(Quat::IDENTITY, factor);
                    t
                });
                Ok(())
            }
            Effect::ResetRotation => {
                api.update_transform(key, &|mut t| {
                    t.rotation = Quat::IDENTITY;
                    t
                });
                Ok(())
            }
            Effect::ResetTransform => {
                api.update_transform(key, &|_| Transform::default());
                Ok(())
            }
            Effect::Pulse { factors, seconds } => {
                let original = api
                    .get_object(key)
                    .map(|o| o.transform.scale)
                    .unwrap_or(Vec3::ONE);
                let scaled = original * *factors;
                api.update_transform(key, &move |mut t| {
                    t.scale = scaled;
                    t
                });
                api.update_transform_after(
                    key,
                    *seconds,
                    Box::new(move |mut t| {
                        t.scale = original;
                        t
                    }),
                );
                Ok(())
            }
            Effect::Jitter(magnitude) => {
                let magnitude = *magnitude;
                let offset = Vec3::new(
                    (rand::random::<f32>() - 0.5) * magnitude,
                    (rand::random::<f32>() - 0.5) * magnitude,
                    (rand::random::<f32>() - 0.5) * magnitude,
                );
                api.update_transform(key, &move |mut t| {
                    t.position += offset;
                    t
                });
                Ok(())
            }
            Effect::GrowRandom(max) => {
                let max = *max;
                let factors = Vec3::new(
                    1.0 + rand::random::<f32>() * max,
                    1.0 + rand::random::<f32>() * max,
                    1.0 + rand::random::<f32>() * max,
                );
                api.update_transform(key, &move |mut t| {
                    t.scale *= factors;
                    t
                });
                Ok(())
            }
            Effect::ParamEdit { field, op, fallback } => {
                let snapshot = api
                    .get_object(key)
                    .ok_or_else(|| format!("object '{key}' not found"))?;
                let is_primitive = matches!(snapshot.object, SceneObject::Primitive { .. });
                if is_primitive && snapshot.parameters.contains_key(*field) {
                    let field = *field;
                    let op = *op;
                    api.update_parameters(key, &move |mut params| {
                        if let Some(value) = params.get_mut(field) {
                            *value = op.apply(*value);
                        }
                        params
                    });
                    Ok(())
                } else if let Some(fallback) = fallback {
                    fallback.apply(key, api)
                } else {
                    Ok(())
                }
            }
            Effect::Seq(effects) => {
                for effect in effects {
                    effect.apply(key, api)?;
                }
                Ok(())
            }
        }
    }
}

/// One builtin verb: console message plus mechanical effect.
#[derive(Debug, Clone)]
pub struct Builtin {
    /// Canonical registry key.
    pub name: &'static str,
    /// `Concept.Verb` provenance tag for the console line.
    pub provenance: &'static str,
    pub message: &'static str,
    pub effect: Effect,
}

impl Builtin {
    /// Log the verb's message and apply its effect to one object.
    pub fn invoke(&self, key: &str, api: &dyn SceneApi) -> Result<(), String> {
        api.log(&format!(
            "[Onto.{}] {}",
            self.provenance,
            self.message.replace("{key}", key)
        ));
        self.effect.apply(key, api)
    }
}

/// Fixed table of builtin verb implementations keyed by canonical verb text.
pub struct FunctionRegistry {
    map: HashMap<&'static str, Builtin>,
}

impl FunctionRegistry {
    /// The process-wide registry. The table is fixed; scripts override it per
    /// triple, they never mutate it.
    pub fn shared() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(FunctionRegistry::build)
    }

    /// Resolve a raw verb label: exact canonical lookup first, then a second
    /// try with qualifying filler words stripped.
    pub fn resolve(&self, label: &str) -> Option<&Builtin> {
        let canonical = canonicalize(label);
        self.map
            .get(canonical.as_str())
            .or_else(|| self.map.get(strip_fillers(&canonical).as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn build() -> FunctionRegistry {
        use Effect::*;
        let mut map = HashMap::new();
        let mut add = |name: &'static str, provenance: &'static str, message: &'static str, effect: Effect| {
            map.insert(name, Builtin { name, provenance, message, effect });
        };

        // Verbs from Self.
        add("identity", "Self.Identity", "Object's unique identity is {key}.", Log);
        add("subjectof", "Self.SubjectOf",
            "Self is the subject of Thought. Its purpose is defined by its parameters and relationships.", Log);
        add("applies", "Self.Applies", "Self applies Logic to itself, causing a slight reorientation.",
            RotateAxisAngle { axis: Vec3::new(1.0, 1.0, 0.0), angle: PI / 16.0 });
        add("seeks", "Self.Seeks", "Self seeks Unity, moving towards the scene's center.",
            ApproachOrigin { t: 0.2 });
        add("affirms", "Self.Affirms", "Affirming existence, increasing presence.", ScaleUniform(1.1));
        add("undergoes", "Self.Undergoes", "Undergoing improvement. Applying a subtle deformation.",
            ParamEdit {
                field: "radius",
                op: ParamOp::Scale(1.05),
                fallback: Some(Box::new(ScaleAxes(Vec3::new(1.0, 1.1, 1.0)))),
            });
        add("pursues", "Self.Pursues", "Pursuing Mastery. Aligning and moving forward.",
            Seq(vec![Translate(Vec3::new(0.0, 0.0, -15.0)), SlerpToIdentity(0.1)]));
        add("experiences", "Self.Experiences",
            "Resonance is experienced. If the object has ontological parameters, they would now be active.", Log);
        add("aspiresto", "Self.AspiresTo",
            "Aspiring to Transcendence. The object elevates, signifying its potential for externalization.",
            Translate(Vec3::new(0.0, 25.0, 0.0)));
        add("isrealizedby", "Self.IsRealizedBy", "The Self is a realization of the Whole. No action taken.", Log);

        // Verbs from Thought.
        add("informs", "Thought.Informs",
            "Thought informs the Self. Its identity ({key}) is now contextualized.", Log);
        add("recursion", "Thought.Recursion", "Thought reflects upon itself, a recursive loop.",
            RotateAxisAngle { axis: Vec3::Y, angle: PI / 8.0 });
        add("utilizes", "Thought.Utilizes", "Thought utilizes Logic, applying a minor structural alignment.",
            SlerpToIdentity(0.1));
        add("synthesizes", "Thought.Synthesizes", "Thought synthesizes toward Unity. Moving towards the origin.",
            ApproachOrigin { t: 0.2 });
        add("represents", "Thought.Represents", "Thought represents Existence. Emphasizing its form.",
            Pulse { factors: Vec3::splat(1.2), seconds: 0.3 });
        add("drives", "Thought.Drives", "Thought drives Improvement. Refining parameters.",
            ParamEdit {
                field: "detail",
                op: ParamOp::Increment { step: 1.0, max: 5.0 },
                fallback: Some(Box::new(ScaleUniform(1.05))),
            });
        add("develops", "Thought.Develops", "Thought develops Mastery. Increasing presence and stability.",
            Seq(vec![ScaleUniform(1.2), SlerpToIdentity(0.2)]));
        add("articulates", "Thought.Articulates", "Thought articulates Resonance. Conceptual link established.", Log);
        add("enables", "Thought.Enables",
            "Thought enables Transcendence. The object shifts to a new plane of possibility.",
            Translate(Vec3::new(0.0, 0.0, -30.0)));
        add("transcends", "Thought.Transcends",
            "Thought transcends the universe. A conceptual leap out of bounds.",
            Translate(Vec3::new(0.0, 100.0, 0.0)));

        // Verbs from Logic.
        add("structures", "Logic.Structures", "Logic structures the Self, applying a rotational matrix.",
            RotateEuler(Vec3::new(0.1, 0.2, 0.3)));
        add("governs", "Logic.Governs", "Logic governs Thought. Aligning object to a rational grid.",
            SnapToGrid(10.0));
        add("foundation", "Logic.Foundation", "Logic is its own Foundation. State is affirmed.", Log);
        add("ensures", "Logic.Ensures", "Logic ensures Unity. This is a conceptual axiom.", Log);
        add("describes", "Logic.Describes",
            "Logic describes Existence through its state variables. See the Inspector.", Log);
        add("validates", "Logic.Validates", "Logic validates Improvement. Parameters are rationalized.",
            ParamEdit {
                field: "radius",
                op: ParamOp::Round,
                fallback: Some(Box::new(Note("No parameters to validate on {key}."))),
            });
        add("underpins", "Logic.Underpins",
            "Logic underpins Mastery. The object's state is a testament to this.", Log);
        add("contradicts", "Logic.Contradicts", "Logic contradicts Resonance, creating a dissonant state.",
            ScaleAxes(Vec3::new(1.0, -1.0, 1.0)));
        add("grounds", "Logic.Grounds", "Logic grounds Transcendence. Moving object to the base plane.",
            FlattenToGround);
        add("isthefoundationof", "Logic.IsTheFoundationOf", "Logic is the foundation of the universe.", Log);

        // Verbs from Unity.
        add("integrates", "Unity.Integrates", "Unity integrates Self. Centering at the world origin.",
            SetPosition(Vec3::ZERO));
        add("harmonizes", "Unity.Harmonizes",
            "Unity harmonizes Thought. Resetting rotation to a stable state.", ResetRotation);
        add("requires", "Unity.Requires", "Unity requires Logic. Conceptual link.", Log);
        add("essence", "Unity.Essence", "Unity is its own Essence. No action needed.", Log);
        add("binds", "Unity.Binds", "Unity binds Existence.", Log);
        add("fosters", "Unity.Fosters", "Unity fosters Improvement. A minor, uniform growth is applied.",
            ScaleUniform(1.05));
        add("culminatesin", "Unity.CulminatesIn",
            "Unity culminates in Mastery. A significant growth in presence.", ScaleUniform(2.0));
        add("amplifies", "Unity.Amplifies",
            "Unity amplifies Resonance. Scaling up non-uniformly to represent this amplification.",
            ScaleAxes(Vec3::new(1.1, 1.5, 1.1)));
        add("achieves", "Unity.Achieves", "Unity achieves Transcendence. This is the goal state.", Log);
        add("istheultimateexpressionof", "Unity.IsTheUltimateExpressionOf",
            "Unity is the ultimate expression of the universe.", Log);

        // Verbs from Existence.
        add("manifestsin", "Existence.ManifestsIn",
            "Existence manifests in Self. Resetting transform to its default state.", ResetTransform);
        add("isponderedby", "Existence.IsPonderedBy",
            "Existence is pondered by Thought. No physical change.", Log);
        add("obeys", "Existence.Obeys", "Existence obeys Logic.", Log);
        add("comprises", "Existence.Comprises", "Existence comprises Unity.", Log);
        add("is", "Existence.Is", "Existence simply is. The object exists.", Log);
        add("evolvesthrough", "Existence.EvolvesThrough",
            "Existence evolves through Improvement. Applying random growth.", GrowRandom(0.2));
        add("isdomainof", "Existence.IsDomainOf", "Existence is the domain of Mastery.", Log);
        add("vibratesin", "Existence.VibratesIn",
            "Existence vibrates in Resonance. Applying a visual pulse.",
            Pulse { factors: Vec3::splat(1.5), seconds: 0.3 });
        add("issurpassedby", "Existence.IsSurpassedBy", "Existence is surpassed by Transcendence.", Log);
        add("givesriseto", "Existence.GivesRiseTo", "Existence gives rise to the universe.", Log);

        // Verbs from Improvement.
        add("refines", "Improvement.Refines", "Improvement refines Self. Increasing scale by 10%.",
            ScaleUniform(1.1));
        add("optimizes", "Improvement.Optimizes", "Improvement optimizes Thought.", Log);
        add("systematizes", "Improvement.Systematizes",
            "Improvement systematizes Logic. Applying orderly rotation.",
            RotateAxisAngle { axis: Vec3::Z, angle: PI / 8.0 });
        add("strengthens", "Improvement.Strengthens",
            "Improvement strengthens Unity. Increasing scale uniformly.", ScaleUniform(1.2));
        add("enhances", "Improvement.Enhances",
            "Improvement enhances Existence. Increasing scale by 25%.", ScaleUniform(1.25));
        add("process", "Improvement.Process", "Improvement is its own Process.", Log);
        add("leadsto", "Improvement.LeadsTo", "Improvement leads to Mastery. Moving forward significantly.",
            Translate(Vec3::new(0.0, 0.0, -20.0)));
        add("finetunes", "Improvement.FineTunes", "Improvement fine-tunes Resonance.", Log);
        add("ispathto", "Improvement.IsPathTo", "Improvement is the path to Transcendence.", Log);
        add("isthecycleof", "Improvement.IsTheCycleOf", "Improvement is the cycle of the universe.", Log);

        // Verbs from Mastery.
        add("actualizes", "Mastery.Actualizes", "Mastery actualizes Self. Setting scale to a perfected state.",
            SetScale(Vec3::splat(3.0)));
        add("requiresdeep", "Mastery.RequiresDeep", "Mastery requires deep Thought.", Log);
        add("appliesperfected", "Mastery.AppliesPerfected",
            "Mastery applies perfected Logic. Snapping to a perfect rotation.",
            SetRotationEuler(Vec3::new(0.0, PI / 4.0, 0.0)));
        add("embodies", "Mastery.Embodies", "Mastery embodies Unity.", Log);
        add("commands", "Mastery.Commands",
            "Mastery commands Existence. The object is centered and enlarged.",
            Seq(vec![SetPosition(Vec3::new(0.0, 5.0, 0.0)), SetScale(Vec3::splat(2.0))]));
        add("isgoalof", "Mastery.IsGoalOf", "Mastery is the goal of Improvement.", Log);
        add("pinnacle", "Mastery.Pinnacle", "Mastery is its own Pinnacle.", Log);
        add("generates", "Mastery.Generates", "Mastery generates Resonance.", Log);
        add("approaches", "Mastery.Approaches", "Mastery approaches Transcendence.", Log);
        add("isthetotalityof", "Mastery.IsTheTotalityOf", "Mastery is the totality of the universe.", Log);

        // Verbs from Resonance.
        add("isfeltby", "Resonance.IsFeltBy", "Resonance is felt by Self.", Log);
        add("isevokedby", "Resonance.IsEvokedBy", "Resonance is evoked by Thought.", Log);
        add("eludes", "Resonance.Eludes", "Resonance eludes pure Logic. Shifting unpredictably.",
            Jitter(15.0));
        add("creates", "Resonance.Creates", "Resonance creates Unity.", Log);
        add("echoesthrough", "Resonance.EchoesThrough",
            "Resonance echoes through Existence. Applying a conceptual pulse.",
            Pulse { factors: Vec3::new(1.8, 0.5, 1.8), seconds: 0.4 });
        add("alignswith", "Resonance.AlignsWith",
            "Resonance aligns with Improvement. Resetting rotation.", ResetRotation);
        add("radiatesfrom", "Resonance.RadiatesFrom", "Resonance radiates from Mastery.", Log);
        add("sympathy", "Resonance.Sympathy", "Resonance is its own Sympathy.", Log);
        add("facilitates", "Resonance.Facilitates", "Resonance facilitates Transcendence.", Log);
        add("isthegroundof", "Resonance.IsTheGroundOf", "Resonance is the ground of the universe.", Log);

        // Verbs from Transcendence.
        add("elevates", "Transcendence.Elevates", "Transcendence elevates Self.",
            Translate(Vec3::new(0.0, 20.0, 0.0)));
        add("goesbeyond", "Transcendence.GoesBeyond", "Transcendence goes beyond Thought.",
            Translate(Vec3::new(0.0, 0.0, -50.0)));
        add("isnotboundby", "Transcendence.IsNotBoundBy", "Transcendence is not bound by Logic.", Log);
        add("isastateof", "Transcendence.IsAStateOf", "Transcendence is a state of Unity.", Log);
        add("risesabove", "Transcendence.RisesAbove", "Transcendence rises above Existence.",
            Translate(Vec3::new(0.0, 50.0, 0.0)));
        add("isaimof", "Transcendence.IsAimOf", "Transcendence is the aim of Improvement.", Log);
        add("ispinnacleof", "Transcendence.IsPinnacleOf", "Transcendence is the pinnacle of Mastery.", Log);
        add("induces", "Transcendence.Induces", "Transcendence induces Resonance.", Log);
        add("action", "Transcendence.Action", "Transcendence is its own Action.", Log);
        add("isthenatureof", "Transcendence.IsTheNatureOf", "Transcendence is the nature of the universe.", Log);

        // Verbs from Nothing/Everything.
        add("mergeswith", "NothingOrEverything.MergesWith",
            "Self merges with the Whole. Returning to origin state.", ResetTransform);
        add("contemplates", "NothingOrEverything.Contemplates", "The universe contemplates Thought.", Log);
        add("isasubsetof", "NothingOrEverything.IsASubsetOf", "Logic is a subset of the universe.", Log);
        add("isanaspectof", "NothingOrEverything.IsAnAspectOf", "Unity is an aspect of the universe.", Log);
        add("emergesfrom", "NothingOrEverything.EmergesFrom", "Existence emerges from the universe.", Log);
        add("occurswithin", "NothingOrEverything.OccursWithin", "Improvement occurs within the universe.", Log);
        add("seekstounderstand", "NothingOrEverything.SeeksToUnderstand",
            "Mastery seeks to understand the universe.", Log);
        add("harmonizeswith", "NothingOrEverything.HarmonizesWith",
            "Resonance harmonizes with the universe.", Log);

        FunctionRegistry { map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleHandle;
    use crate::matrix::default_matrix;
    use crate::scene::{MemoryScene, PrimitiveKind};

    #[test]
    fn test_canonicalize_folds_case_space_and_hyphens() {
        assert_eq!(canonicalize("Seeks"), "seeks");
        assert_eq!(canonicalize("Is Realized by"), "isrealizedby");
        assert_eq!(canonicalize("Fine-tunes"), "finetunes");
    }

    #[test]
    fn test_filler_words_stripped_on_second_try() {
        let registry = FunctionRegistry::shared();
        // Exact entries win without stripping.
        assert_eq!(registry.resolve("Requires Deep").unwrap().name, "requiresdeep");
        // A label only reachable after filler stripping.
        assert_eq!(registry.resolve("Governs Perfected").unwrap().name, "governs");
    }

    #[test]
    fn test_every_default_matrix_cell_resolves_to_a_builtin() {
        let registry = FunctionRegistry::shared();
        for (row, cells) in &default_matrix().0 {
            for (col, verb) in cells {
                assert!(
                    registry.resolve(verb).is_some(),
                    "no builtin for {row} -> {verb} -> {col}"
                );
            }
        }
    }

    #[test]
    fn test_seeks_approaches_origin_on_horizontal_plane() {
        let console = ConsoleHandle::new();
        let scene = MemoryScene::new(console);
        let key = scene.add_primitive(PrimitiveKind::Box);
        scene.update_transform(&key, &|mut t| {
            t.position = Vec3::new(10.0, 5.0, 10.0);
            t
        });

        let registry = FunctionRegistry::shared();
        registry.resolve("Seeks").unwrap().invoke(&key, &*scene).unwrap();

        let position = scene.get_object(&key).unwrap().transform.position;
        assert!(position.x.abs() < 10.0);
        assert!(position.z.abs() < 10.0);
        assert_eq!(position.y, 5.0);
    }

    #[test]
    fn test_undergoes_prefers_radius_parameter() {
        let console = ConsoleHandle::new();
        let scene = MemoryScene::new(console);
        let sphere = scene.add_primitive(PrimitiveKind::Sphere);
        let boxy = scene.add_primitive(PrimitiveKind::Box);

        let registry = FunctionRegistry::shared();
        let undergoes = registry.resolve("Undergoes").unwrap();
        undergoes.invoke(&sphere, &*scene).unwrap();
        undergoes.invoke(&boxy, &*scene).unwrap();

        let sphere_snapshot = scene.get_object(&sphere).unwrap();
        assert!((sphere_snapshot.parameters["radius"] - 5.25).abs() < 1e-5);
        assert_eq!(sphere_snapshot.transform.scale, Vec3::ONE);

        // No radius on a box: the fallback stretches it vertically.
        let box_snapshot = scene.get_object(&boxy).unwrap();
        assert!((box_snapshot.transform.scale.y - 1.1).abs() < 1e-5);
        assert_eq!(box_snapshot.transform.scale.x, 1.0);
    }

    #[test]
    fn test_pulse_schedules_restore() {
        let console = ConsoleHandle::new();
        let scene = MemoryScene::new(console);
        let key = scene.add_primitive(PrimitiveKind::Box);
        scene.drain_due(0.0);

        let registry = FunctionRegistry::shared();
        registry.resolve("Vibrates In").unwrap().invoke(&key, &*scene).unwrap();

        assert_eq!(scene.get_object(&key).unwrap().transform.scale, Vec3::splat(1.5));
        scene.drain_due(0.5);
        assert_eq!(scene.get_object(&key).unwrap().transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_governs_snaps_to_grid() {
        let console = ConsoleHandle::new();
        let scene = MemoryScene::new(console);
        let key = scene.add_primitive(PrimitiveKind::Box);
        scene.update_transform(&key, &|mut t| {
            t.position = Vec3::new(13.0, -4.0, 27.0);
            t
        });

        FunctionRegistry::shared()
            .resolve("Governs")
            .unwrap()
            .invoke(&key, &*scene)
            .unwrap();

        let position = scene.get_object(&key).unwrap().transform.position;
        assert_eq!(position, Vec3::new(10.0, 0.0, 30.0));
    }
}
