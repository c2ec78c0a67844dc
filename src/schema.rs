// Database schema definitions
diesel::table! {
    personal (id) {
        id -> Int4,
        nombre -> Varchar,
        apellido -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        cargo -> Varchar,
        activo -> Bool,
        creado_en -> Timestamp,
    }
}

diesel::table! {
    especies (id) {
        id -> Int4,
        nombre_cientifico -> Varchar,
        nombre_comun -> Varchar,
        estado_conservacion -> Varchar,
    }
}

diesel::table! {
    campamentos (id) {
        id -> Int4,
        nombre -> Varchar,
    }
}

diesel::table! {
    nidos (id) {
        id -> Int4,
        codigo -> Varchar,
        campamento_id -> Int4,
        especie_id -> Int4,
        fecha_puesta -> Date,
        cantidad_huevos -> Int4,
        estado -> Varchar,
    }
}

diesel::table! {
    eventos (id) {
        id -> Int4,
        tipo -> Varchar,
        nido_id -> Nullable<Int4>,
        campamento_id -> Int4,
        personal_id -> Int4,
        fecha -> Timestamp,
        descripcion -> Nullable<Varchar>,
    }
}

diesel::table! {
    observaciones (id) {
        id -> Int4,
        nido_id -> Int4,
        personal_id -> Int4,
        fecha -> Timestamp,
        nota -> Varchar,
    }
}

diesel::joinable!(nidos -> campamentos (campamento_id));
diesel::joinable!(nidos -> especies (especie_id));
diesel::joinable!(eventos -> campamentos (campamento_id));
diesel::joinable!(eventos -> personal (personal_id));
diesel::joinable!(observaciones -> nidos (nido_id));
diesel::joinable!(observaciones -> personal (personal_id));

diesel::allow_tables_to_appear_in_same_query!(
    personal, especies, campamentos, nidos, eventos, observaciones,
);
