use diesel::{allow_tables_to_appear_in_same_query, table};

table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        role -> Text,
        full_name -> Nullable<Text>,
        phone -> Nullable<Text>,
        sports -> Jsonb,
        company_name -> Nullable<Text>,
        company_document -> Nullable<Text>,
        bank_info -> Nullable<Jsonb>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    spaces (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        lat -> Double,
        lng -> Double,
        address -> Text,
        city -> Nullable<Text>,
        available_sports -> Jsonb,
        amenities -> Jsonb,
        opening_hours -> Jsonb,
        manager_id -> Uuid,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    events (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        sport_type -> Text,
        skill_level -> Text,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        lat -> Double,
        lng -> Double,
        address -> Text,
        city -> Nullable<Text>,
        max_participants -> Integer,
        participants -> Jsonb,
        organizer_id -> Uuid,
        space_id -> Nullable<Uuid>,
        space_name -> Nullable<Text>,
        price_per_person -> Double,
        is_private -> Bool,
        status -> Text,
        version -> Integer,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    reservations (id) {
        id -> Uuid,
        space_id -> Uuid,
        space_name -> Text,
        event_id -> Nullable<Uuid>,
        organizer_id -> Uuid,
        sport_type -> Text,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        participants_count -> Integer,
        total_price -> Double,
        status -> Text,
        notes -> Nullable<Text>,
        rejection_reason -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    friendships (id) {
        id -> Uuid,
        user_lo -> Uuid,
        user_hi -> Uuid,
        requested_by -> Uuid,
        status -> Text,
        blocked_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    social_groups (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        creator_id -> Uuid,
        is_private -> Bool,
        members -> Jsonb,
        version -> Integer,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Text,
        title -> Text,
        message -> Text,
        related_id -> Nullable<Uuid>,
        action_url -> Nullable<Text>,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    outbox (id) {
        id -> BigInt,
        recipient_id -> Uuid,
        kind -> Text,
        title -> Text,
        message -> Text,
        related_id -> Nullable<Uuid>,
        action_url -> Nullable<Text>,
        created_at -> Timestamptz,
        dispatched_at -> Nullable<Timestamptz>,
        retry_count -> Integer,
        error_message -> Nullable<Text>,
    }
}

allow_tables_to_appear_in_same_query!(
    users,
    spaces,
    events,
    reservations,
    friendships,
    social_groups,
    notifications,
    outbox,
);
