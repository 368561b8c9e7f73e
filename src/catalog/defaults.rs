/// Built-in word list used when no catalog file is configured
pub(super) const DEFAULT_WORDS: &[(&str, &[&str])] = &[
    (
        "Animals",
        &[
            "Elephant", "Giraffe", "Penguin", "Dolphin", "Kangaroo", "Octopus", "Owl",
        ],
    ),
    (
        "Food",
        &["Pizza", "Croissant", "Sushi", "Pancake", "Lasagna", "Taco"],
    ),
    (
        "Places",
        &["Beach", "Library", "Hospital", "Airport", "Museum", "Castle"],
    ),
    (
        "Sports",
        &["Football", "Tennis", "Skiing", "Surfing", "Boxing", "Cycling"],
    ),
    (
        "Jobs",
        &["Firefighter", "Chef", "Astronaut", "Plumber", "Teacher"],
    ),
    (
        "Objects",
        &["Umbrella", "Toothbrush", "Candle", "Ladder", "Mirror", "Scissors"],
    ),
    ("Instruments", &["Piano", "Violin", "Drums", "Trumpet"]),
    ("Weather", &["Rainbow", "Thunder", "Snowflake"]),
];
