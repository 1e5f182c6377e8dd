// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Estrutura de dados ("claims") dentro do JWT emitido pelo serviço de identidade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    /// Tenants (clínicas/laboratórios) que o usuário pode acessar
    #[serde(default)]
    pub tenants: Vec<Uuid>,
}

impl Claims {
    pub fn pode_acessar(&self, tenant_id: Uuid) -> bool {
        self.tenants.contains(&tenant_id)
    }
}
