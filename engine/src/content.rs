use std::collections::HashMap;

pub fn builtin_encounters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "goblin_ambush",
            include_str!("../content/encounters/goblin_ambush.json"),
        ),
        ("duel", include_str!("../content/encounters/duel.json")),
    ])
}

pub fn builtin_rules() -> HashMap<&'static str, &'static str> {
    HashMap::from([("default", include_str!("../content/rules/default.yaml"))])
}
