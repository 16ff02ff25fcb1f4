//! CIDOC-CRM class and property codes the engine interprets.
//!
//! The temporal-role codes (`OA*`) are the legacy reification vocabulary;
//! everything else is plain CIDOC-CRM.

/// Entity class codes.
pub mod class {
    pub const EVENT: &str = "E5";
    pub const DESTRUCTION: &str = "E6";
    pub const ACTIVITY: &str = "E7";
    pub const ACQUISITION: &str = "E8";
    pub const PRODUCTION: &str = "E12";
    pub const PHYSICAL_THING: &str = "E18";
    pub const PERSON: &str = "E21";
    pub const MAN_MADE_OBJECT: &str = "E22";
    pub const LINGUISTIC_OBJECT: &str = "E33";
    pub const LEGAL_BODY: &str = "E40";
    pub const APPELLATION: &str = "E41";
    pub const PLACE: &str = "E53";
    pub const TIME_PRIMITIVE: &str = "E61";
    pub const GROUP: &str = "E74";
    pub const ACTOR_APPELLATION: &str = "E82";

    /// Classes whose temporal data is normalized per actor.
    pub const ACTORS: &[&str] = &[PERSON, LEGAL_BODY, GROUP];

    /// Classes that are intrinsically time-bounded.
    pub const EVENTS: &[&str] = &[EVENT, DESTRUCTION, ACTIVITY, ACQUISITION, PRODUCTION];

    /// Finds and physical objects.
    pub const FINDS: &[&str] = &[PHYSICAL_THING, MAN_MADE_OBJECT];

    /// Documents.
    pub const DOCUMENTS: &[&str] = &[LINGUISTIC_OBJECT];
}

/// Link property codes.
pub mod property {
    pub const HAS_IDENTIFIER: &str = "P1";
    pub const TOOK_PLACE_AT: &str = "P7";
    pub const HAD_PARTICIPANT: &str = "P11";
    pub const CARRIED_OUT_BY: &str = "P14";
    pub const ACQUIRED_TITLE_THROUGH: &str = "P22";
    pub const SURRENDERED_TITLE_THROUGH: &str = "P23";
    pub const HAS_CURRENT_LOCATION: &str = "P53";
    pub const HAS_TRANSLATION: &str = "P73";
    pub const IS_IDENTIFIED_BY: &str = "P131";

    pub const FIRST_APPEARANCE: &str = "OA1";
    pub const LAST_APPEARANCE: &str = "OA2";
    pub const BIRTH: &str = "OA3";
    pub const DEATH: &str = "OA4";
    pub const BEGIN: &str = "OA5";
    pub const END: &str = "OA6";
    pub const FIRST_APPEARS_AT: &str = "OA8";
    pub const LAST_APPEARS_AT: &str = "OA9";

    /// Properties whose only purpose is to point at a reified date value.
    pub const TEMPORAL_ROLES: &[&str] = &[
        FIRST_APPEARANCE, LAST_APPEARANCE, BIRTH, DEATH, BEGIN, END,
    ];

    /// Involvements that carry their own interval.
    pub const INVOLVEMENTS: &[&str] = &[
        HAD_PARTICIPANT, CARRIED_OUT_BY, ACQUIRED_TITLE_THROUGH, SURRENDERED_TITLE_THROUGH,
    ];

    /// Every property a fresh legacy store defines.
    pub const ALL: &[&str] = &[
        HAS_IDENTIFIER, TOOK_PLACE_AT, HAD_PARTICIPANT, CARRIED_OUT_BY,
        ACQUIRED_TITLE_THROUGH, SURRENDERED_TITLE_THROUGH, HAS_CURRENT_LOCATION,
        HAS_TRANSLATION, IS_IDENTIFIED_BY,
        FIRST_APPEARANCE, LAST_APPEARANCE, BIRTH, DEATH, BEGIN, END,
        FIRST_APPEARS_AT, LAST_APPEARS_AT,
    ];
}

/// `system_type` values of reified date nodes.
pub mod system_type {
    pub const EXACT_DATE_VALUE: &str = "exact date value";
    pub const FROM_DATE_VALUE: &str = "from date value";
    pub const TO_DATE_VALUE: &str = "to date value";
}
