//! Diesel table definitions for the outage tables.
//!
//! Keep these in step with `backend/migrations`; `diesel print-schema` against
//! a migrated database regenerates them.

diesel::table! {
    /// Raw outage reports. The first write for an identifier wins.
    outage_events (outage_id) {
        outage_id -> Text,
        latitude -> Float8,
        longitude -> Float8,
        affected_customers -> Int4,
        cause -> Text,
        jurisdiction -> Text,
        convex_hull -> Jsonb,
        first_seen_at -> Timestamptz,
    }
}

diesel::table! {
    /// Enriched outage lifecycles.
    ///
    /// `ended_at` and `fix_duration` stay null while `lifecycle_state` is
    /// `open` and are written once on restore.
    outage_tracker (outage_id) {
        outage_id -> Text,
        latitude -> Float8,
        longitude -> Float8,
        state -> Text,
        county -> Text,
        block_fips -> Text,
        convex_hull -> Jsonb,
        jurisdiction -> Text,
        origin -> Text,
        affected_customers -> Int4,
        cause -> Text,
        lifecycle_state -> Text,
        started_at -> Timestamptz,
        ended_at -> Nullable<Timestamptz>,
        fix_duration -> Nullable<Text>,
    }
}

diesel::joinable!(outage_tracker -> outage_events (outage_id));
diesel::allow_tables_to_appear_in_same_query!(outage_events, outage_tracker);
