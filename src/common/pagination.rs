use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const LIMITE_PADRAO: i64 = 10;
const LIMITE_MAXIMO: i64 = 100;

// Parâmetros de paginação vindos da query string (?page=1&limit=10)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[param(example = 1)]
    pub page: Option<i64>,
    #[param(example = 10)]
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page: Some(page), limit: Some(limit) }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(LIMITE_PADRAO).clamp(1, LIMITE_MAXIMO)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Envelope das listagens paginadas: `{ data, total, page, lastPage }`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, query: &PageQuery) -> Self {
        let limit = query.limit();
        Self {
            data,
            total,
            page: query.page(),
            last_page: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(95, 20, 5)]
    fn calcula_ultima_pagina(#[case] total: i64, #[case] limit: i64, #[case] esperado: i64) {
        let page = Paginated::<()>::new(Vec::new(), total, &PageQuery::new(1, limit));
        assert_eq!(page.last_page, esperado);
    }

    #[test]
    fn aplica_padroes_e_limites() {
        let q = PageQuery::default();
        assert_eq!((q.page(), q.limit(), q.offset()), (1, 10, 0));

        let q = PageQuery::new(0, 1000);
        assert_eq!((q.page(), q.limit()), (1, 100));

        let q = PageQuery::new(3, 20);
        assert_eq!(q.offset(), 40);
    }
}
