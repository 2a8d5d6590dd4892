//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a migration
//! changes the schema, regenerate with `diesel print-schema` or update by
//! hand.

diesel::table! {
    /// Accounts able to log in.
    users (id) {
        id -> Uuid,
        /// Normalised (trimmed, lower-cased) address; unique.
        email -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        is_active -> Bool,
        is_staff -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Client projects.
    projects (id) {
        id -> Int8,
        owner_id -> Uuid,
        title -> Varchar,
        /// One of the `ProjectStatus` wire names.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One conversation per project; archived instead of deleted.
    conversations (id) {
        id -> Int8,
        project_id -> Int8,
        is_archived -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> Int8,
        conversation_id -> Int8,
        sender_id -> Uuid,
        content -> Text,
        has_attachment -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Read marks; the composite key makes marking idempotent.
    message_reads (message_id, user_id) {
        message_id -> Int8,
        user_id -> Uuid,
        read_at -> Timestamptz,
    }
}

diesel::table! {
    message_attachments (id) {
        id -> Int8,
        message_id -> Int8,
        file_name -> Varchar,
        file_type -> Varchar,
        size_bytes -> Int8,
        /// Path relative to the attachment root.
        storage_key -> Text,
        uploaded_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> users (owner_id));
diesel::joinable!(conversations -> projects (project_id));
diesel::joinable!(messages -> conversations (conversation_id));
diesel::joinable!(message_reads -> messages (message_id));
diesel::joinable!(message_attachments -> messages (message_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    conversations,
    messages,
    message_reads,
    message_attachments,
);
