table! {
    acl_entries (user, document) {
        user -> Int4,
        document -> Int4,
        permissions -> Int4,
    }
}

table! {
    audit_log (id) {
        id -> Int4,
        timestamp -> Timestamp,
        actor -> Nullable<Int4>,
        kind -> Varchar,
        target_kind -> Varchar,
        target_id -> Int4,
        action_object_kind -> Nullable<Varchar>,
        action_object_id -> Nullable<Int4>,
    }
}

table! {
    document_versions (id) {
        id -> Int4,
        document -> Int4,
        timestamp -> Timestamp,
        comment -> Varchar,
        filename -> Varchar,
        mime -> Varchar,
        path -> Varchar,
        page_count -> Nullable<Int4>,
    }
}

table! {
    documents (id) {
        id -> Int4,
        label -> Varchar,
    }
}

table! {
    recent_documents (user, document) {
        user -> Int4,
        document -> Int4,
        accessed -> Timestamp,
    }
}

table! {
    reviews (id) {
        id -> Int4,
        document -> Int4,
        user -> Int4,
        comment -> Text,
        submit_date -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        full_name -> Varchar,
        is_super -> Bool,
        permissions -> Int4,
    }
}

joinable!(acl_entries -> documents (document));
joinable!(acl_entries -> users (user));
joinable!(document_versions -> documents (document));
joinable!(recent_documents -> documents (document));
joinable!(recent_documents -> users (user));
joinable!(reviews -> documents (document));
joinable!(reviews -> users (user));

allow_tables_to_appear_in_same_query!(
    acl_entries,
    audit_log,
    document_versions,
    documents,
    recent_documents,
    reviews,
    users,
);
