use serde::{Deserialize, Deserializer};

// Para PATCH: distingue campo ausente (None) de campo enviado como null (Some(None)).
// Usar junto com `#[serde(default)]`.
pub fn anulavel<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "anulavel")]
        campo: Option<Option<i32>>,
    }

    #[test]
    fn diferencia_ausente_de_nulo() {
        let ausente: Patch = serde_json::from_str("{}").unwrap();
        let nulo: Patch = serde_json::from_str(r#"{"campo": null}"#).unwrap();
        let valor: Patch = serde_json::from_str(r#"{"campo": 3}"#).unwrap();

        assert_eq!(ausente.campo, None);
        assert_eq!(nulo.campo, Some(None));
        assert_eq!(valor.campo, Some(Some(3)));
    }
}
