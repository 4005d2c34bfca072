diesel::table! {
    payments (payment_id) {
        payment_id -> Int4,
        bill_id -> Int4,
        amount -> Numeric,
        method -> Varchar,
        reference -> Varchar,
        paid_at -> Timestamptz,
    }
}
