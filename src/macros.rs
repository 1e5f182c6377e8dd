// Aplicação de PATCH campo a campo: todo campo `Some` do payload sobrescreve o da entidade.

/// Para campos obrigatórios da entidade (`T` <- `Option<T>`).
macro_rules! aplicar_campos {
    ($alvo:expr, $patch:expr; $($campo:ident),* $(,)?) => {
        $(if let Some(v) = $patch.$campo { $alvo.$campo = v; })*
    };
}

/// Para campos opcionais da entidade (`Option<T>` <- `Option<T>`).
macro_rules! aplicar_opcionais {
    ($alvo:expr, $patch:expr; $($campo:ident),* $(,)?) => {
        $(if let Some(v) = $patch.$campo { $alvo.$campo = Some(v); })*
    };
}
