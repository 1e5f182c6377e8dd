pub mod auth;
pub mod conta_pagar;
pub mod convenio;
pub mod empresa;
pub mod exame;
pub mod exame_unidade;
pub mod formulario;
pub mod laboratorio_apoio;
pub mod ordem_servico;
pub mod prestador;
pub mod telemedicina;
