pub mod categorias;
pub mod contas_pagar;
pub mod convenios;
pub mod exames;
pub mod exames_laboratorios;
pub mod formularios;
pub mod laboratorios_apoio;
pub mod ordens_servico;
pub mod prestadores;
pub mod telemedicina;
pub mod telemedicina_exames;
