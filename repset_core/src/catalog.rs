//! Default catalog of exercise definitions and interval timer templates.
//!
//! The catalog is read-only reference data. Sessions copy an exercise's name
//! when it is added, so nothing here is consulted after that point.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn def(
    id: &str,
    name: &str,
    muscle: &str,
    category: ExerciseCategory,
    difficulty: Difficulty,
) -> ExerciseDefinition {
    ExerciseDefinition {
        id: id.into(),
        name: name.into(),
        muscle: muscle.into(),
        category,
        difficulty,
        description: String::new(),
        benefits: Vec::new(),
        primary_muscles: Vec::new(),
        secondary_muscles: Vec::new(),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ExerciseDefinition {
    fn about(
        mut self,
        description: &str,
        benefits: &[&str],
        primary: &[&str],
        secondary: &[&str],
    ) -> Self {
        self.description = description.into();
        self.benefits = owned(benefits);
        self.primary_muscles = owned(primary);
        self.secondary_muscles = owned(secondary);
        self
    }
}

/// Builds the default catalog of built-in exercises
pub fn build_default_catalog() -> Catalog {
    use Difficulty::*;
    use ExerciseCategory as C;

    let exercises = vec![
        // Chest
        def("chest_bench_press", "Barbell Bench Press", "Chest", C::Chest, Intermediate).about(
            "Lie on a flat bench. Grip the barbell slightly wider than shoulder-width. Lower the bar to your chest and press it back up to the starting position.",
            &[
                "Builds pectoral muscle mass",
                "Increases pushing strength",
                "Engages triceps and shoulders",
            ],
            &["Pectoralis Major"],
            &["Triceps Brachii", "Anterior Deltoids"],
        ),
        def("chest_incline_dumbbell", "Incline Dumbbell Press", "Chest", C::Chest, Intermediate).about(
            "Sit on an incline bench holding dumbbells. Press them up until your arms are extended, then lower them slowly to chest level.",
            &[
                "Targets upper chest",
                "Improves shoulder stability",
                "Allows greater range of motion",
            ],
            &["Clavicular Pectoralis"],
            &["Triceps", "Front Delts"],
        ),
        def("chest_pushup", "Push Up", "Chest", C::Chest, Beginner).about(
            "Start in a plank position. Lower your body until your chest nearly touches the floor, then push back up.",
            &["No equipment needed", "Builds core stability", "Functional pushing strength"],
            &["Pectoralis Major"],
            &["Triceps", "Core", "Anterior Deltoids"],
        ),
        def("chest_dips", "Dips", "Chest", C::Chest, Advanced).about(
            "Using parallel bars, lower your body by bending your arms while leaning forward slightly. Push back up to the top.",
            &[
                "Excellent for lower chest definition",
                "Builds tricep mass",
                "Increases shoulder flexibility",
            ],
            &["Lower Pectoralis"],
            &["Triceps", "Anterior Deltoids"],
        ),
        // Back
        def("back_deadlift", "Deadlift", "Back", C::Back, Advanced).about(
            "Stand with feet hip-width apart. Hinge at hips to grip bar. Keep back flat, drive through heels to stand up straight.",
            &["Full body compound movement", "Builds posterior chain", "Increases raw strength"],
            &["Erector Spinae", "Glutes", "Hamstrings"],
            &["Lats", "Traps", "Forearms"],
        ),
        def("back_pullup", "Pull Up", "Back", C::Back, Intermediate).about(
            "Hang from a bar with palms facing away. Pull your body up until your chin passes the bar. Lower slowly.",
            &[
                "Builds back width (lats)",
                "Increases functional pulling strength",
                "Improves grip strength",
            ],
            &["Latissimus Dorsi"],
            &["Biceps", "Rhomboids"],
        ),
        def("back_rows", "Barbell Row", "Back", C::Back, Intermediate).about(
            "Bend knees slightly and hinge forward at hips. Pull the barbell towards your lower chest/waist.",
            &["Thickens the back", "Improves posture", "Strengthens lower back isometrically"],
            &["Rhomboids", "Lats"],
            &["Biceps", "Rear Deltoids"],
        ),
        // Legs
        def("legs_squat", "Barbell Squat", "Legs", C::Legs, Advanced).about(
            "Place bar on upper back. Feet shoulder-width. Lower hips back and down. Drive back up.",
            &["King of leg exercises", "Releases anabolic hormones", "Builds core strength"],
            &["Quadriceps", "Glutes"],
            &["Hamstrings", "Calves", "Core"],
        ),
        def("legs_press", "Leg Press", "Legs", C::Legs, Beginner).about(
            "Sit in the machine, place feet on platform. Push platform away until legs are extended (soft knees). Lower slowly.",
            &[
                "Isolates legs without back strain",
                "Allows heavy loading",
                "Safety stops available",
            ],
            &["Quadriceps"],
            &["Glutes", "Hamstrings"],
        ),
        def("legs_lunge", "Walking Lunges", "Legs", C::Legs, Intermediate).about(
            "Step forward with one leg, lowering hips until both knees are bent at approx 90 degrees.",
            &["Improves balance", "Unilateral leg development", "Functional movement"],
            &["Quads", "Glutes"],
            &["Hamstrings", "Core"],
        ),
        def("legs_rdl", "Romanian Deadlift", "Hamstrings", C::Legs, Intermediate).about(
            "Hold bar. Keep legs slightly bent but stiff. Hinge at hips to lower bar along legs until stretch is felt.",
            &["Isolates hamstrings", "Builds glutes", "Improves hip hinge mechanics"],
            &["Hamstrings"],
            &["Glutes", "Lower Back"],
        ),
        // Shoulders
        def("shoulder_ohp", "Overhead Press", "Shoulders", C::Shoulders, Intermediate).about(
            "Stand with bar on front shoulders. Press bar vertically overhead until arms locked out. Return to start.",
            &[
                "Builds total shoulder mass",
                "Engages core for stability",
                "Functional vertical pushing",
            ],
            &["Anterior Deltoid"],
            &["Triceps", "Upper Chest", "Lateral Deltoid"],
        ),
        def("shoulder_latraise", "Lateral Raise", "Shoulders", C::Shoulders, Beginner).about(
            "Stand holding dumbbells at sides. Raise arms out to sides until shoulder height.",
            &["Widens the shoulders", "Isolates medial deltoid", "Improves V-taper look"],
            &["Lateral Deltoid"],
            &["Traps"],
        ),
        def("shoulder_facepull", "Face Pulls", "Shoulders", C::Shoulders, Beginner).about(
            "Using a cable rope set high, pull rope towards your face, separating hands at the end.",
            &["Best for shoulder health", "Corrects posture", "Targets often neglected rear delts"],
            &["Rear Deltoid", "Rotator Cuff"],
            &["Rhomboids", "Traps"],
        ),
        // Arms
        def("arms_bicepcurl", "Barbell Curl", "Arms", C::Arms, Beginner).about(
            "Stand holding barbell. Curl weight up towards chest while keeping elbows pinned to sides.",
            &["Builds overall bicep mass", "Simple execution", "Allow relatively heavy weight"],
            &["Biceps Brachii"],
            &["Forearms"],
        ),
        def("arms_tricepex", "Tricep Pushdown", "Arms", C::Arms, Beginner).about(
            "Use cable machine. Keep elbows at sides. Push bar/rope down until arms fully extended.",
            &["Isolates triceps", "Constant tension", "Easy to drop set"],
            &["Triceps Brachii (Lateral Head)"],
            &["Triceps Brachii (Long Head)"],
        ),
        def("arms_hammer", "Hammer Curl", "Arms", C::Arms, Beginner).about(
            "Hold dumbbells with neutral grip (palms facing each other). Curl up.",
            &["Targets brachialis (thickness)", "Forearm development", "Stronger grip"],
            &["Brachialis", "Brachioradialis"],
            &["Biceps"],
        ),
        // Core
        def("core_plank", "Plank", "Core", C::Core, Beginner).about(
            "Hold a pushup position but on your elbows. Keep body in straight line. Hold.",
            &["Total core stability", "Prevents back pain", "Isometric strength"],
            &["Transverse Abdominis"],
            &["Rectus Abdominis", "Obliques"],
        ),
        def("core_russiantwist", "Russian Twist", "Core", C::Core, Intermediate).about(
            "Sit on floor, feet lifted. Twist torso from side to side, touching floor.",
            &["Targets obliques", "Rotational strength", "Improves balance"],
            &["Obliques"],
            &["Rectus Abdominis"],
        ),
        // Cardio
        def("cardio_treadmill", "Treadmill Run", "Cardio", C::Cardio, Beginner).about(
            "Running or walking on treadmill machinery.",
            &["Cardiovascular health", "Calorie burning", "Leg endurance"],
            &["Heart"],
            &["Legs"],
        ),
    ];

    Catalog { exercises }
}

impl Catalog {
    /// Keyed lookup by catalog id
    pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// All definitions in a category, in catalog order
    pub fn by_category(&self, category: ExerciseCategory) -> Vec<&ExerciseDefinition> {
        self.exercises
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for exercise in &self.exercises {
            if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", exercise.id));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has an empty name", exercise.id));
            }
            if exercise.primary_muscles.is_empty() {
                errors.push(format!("Exercise '{}' lists no primary muscles", exercise.id));
            }
        }

        errors
    }
}

/// Built-in interval timer presets
pub fn default_timer_templates() -> Vec<TimerTemplate> {
    let template = |id: &str, name: &str, work, rest, rounds| TimerTemplate {
        id: id.into(),
        name: name.into(),
        work,
        rest,
        rounds,
    };

    vec![
        template("tabata", "Tabata", 20, 10, 8),
        template("hiit_standard", "Standard HIIT", 30, 30, 10),
        template("emom_10", "EMOM 10min", 60, 0, 10),
        template("boxing", "Boxing Rounds", 180, 60, 12),
    ]
}
