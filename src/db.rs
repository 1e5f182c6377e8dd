pub mod conta_pagar_repo;
pub use conta_pagar_repo::{ContaPagarRepository, PgContaPagarRepository};
pub mod convenio_repo;
pub use convenio_repo::{ConvenioRepository, PgConvenioRepository};
pub mod empresa_repo;
pub use empresa_repo::{EmpresaRepository, PgEmpresaRepository};
pub mod exame_repo;
pub use exame_repo::{ExameRepository, PgExameRepository};
pub mod exame_unidade_repo;
pub use exame_unidade_repo::{ExameUnidadeRepository, PgExameUnidadeRepository};
pub mod formulario_repo;
pub use formulario_repo::{FormularioRepository, PgFormularioRepository};
pub mod laboratorio_apoio_repo;
pub use laboratorio_apoio_repo::{
    ExameLaboratorioApoioRepository, LaboratorioApoioRepository, PgExameLaboratorioApoioRepository,
    PgLaboratorioApoioRepository,
};
pub mod ordem_servico_repo;
pub use ordem_servico_repo::{OrdemServicoRepository, PgOrdemServicoRepository};
pub mod prestador_repo;
pub use prestador_repo::{CategoriaRepository, PgCategoriaRepository, PgPrestadorRepository, PrestadorRepository};
pub mod telemedicina_repo;
pub use telemedicina_repo::{
    PgTelemedicinaExameRepository, PgTelemedicinaRepository, TelemedicinaExameRepository,
    TelemedicinaRepository,
};

#[cfg(test)]
pub mod memory;
