pub mod categoria_service;
pub mod conta_pagar_service;
pub mod convenio_service;
pub mod exame_laboratorio_service;
pub mod exame_service;
pub mod exame_unidade_service;
pub mod formulario_service;
pub mod laboratorio_apoio_service;
pub mod ordem_servico_service;
pub mod prestador_service;
pub mod referencias;
pub mod telemedicina_exame_service;
pub mod telemedicina_service;
