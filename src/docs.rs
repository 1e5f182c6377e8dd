// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Exames ---
        handlers::exames::create_exame,
        handlers::exames::list_exames,
        handlers::exames::search_exames,
        handlers::exames::find_exames_by_codigos,
        handlers::exames::list_exames_com_preparo,
        handlers::exames::list_exames_urgentes,
        handlers::exames::bulk_update_status,
        handlers::exames::list_exames_by_tipo,
        handlers::exames::list_exames_by_laboratorio,
        handlers::exames::get_exame_by_codigo,
        handlers::exames::get_exame,
        handlers::exames::update_exame,
        handlers::exames::delete_exame,
        handlers::exames::vincular_unidade,
        handlers::exames::list_unidades_do_exame,
        handlers::exames::list_exames_da_unidade,
        handlers::exames::get_vinculo_unidade,
        handlers::exames::update_vinculo_unidade,
        handlers::exames::delete_vinculo_unidade,
        handlers::exames::toggle_vinculo_unidade,

        // --- Laboratórios de Apoio ---
        handlers::laboratorios_apoio::create_laboratorio,
        handlers::laboratorios_apoio::list_laboratorios,
        handlers::laboratorios_apoio::list_laboratorios_ativos,
        handlers::laboratorios_apoio::get_laboratorio_by_codigo,
        handlers::laboratorios_apoio::get_laboratorio,
        handlers::laboratorios_apoio::update_laboratorio,
        handlers::laboratorios_apoio::delete_laboratorio,
        handlers::laboratorios_apoio::toggle_laboratorio,

        // --- Exames x Laboratórios ---
        handlers::exames_laboratorios::create_exame_laboratorio,
        handlers::exames_laboratorios::create_exame_laboratorio_batch,
        handlers::exames_laboratorios::list_exames_laboratorios,
        handlers::exames_laboratorios::list_by_exame,
        handlers::exames_laboratorios::list_by_laboratorio,
        handlers::exames_laboratorios::get_exame_laboratorio,
        handlers::exames_laboratorios::update_exame_laboratorio,
        handlers::exames_laboratorios::delete_exame_laboratorio,
        handlers::exames_laboratorios::toggle_exame_laboratorio,

        // --- Ordens de Serviço ---
        handlers::ordens_servico::add_exame_os,
        handlers::ordens_servico::list_exames_os,
        handlers::ordens_servico::get_exame_os,
        handlers::ordens_servico::update_status_exame_os,
        handlers::ordens_servico::add_resultado,
        handlers::ordens_servico::list_resultados,
        handlers::ordens_servico::revisar_resultado,

        // --- Prestadores de Serviço ---
        handlers::prestadores::create_prestador,
        handlers::prestadores::list_prestadores,
        handlers::prestadores::list_prestadores_ativos,
        handlers::prestadores::search_prestadores,
        handlers::prestadores::get_prestador_by_codigo,
        handlers::prestadores::get_prestador_by_cnpj,
        handlers::prestadores::get_prestador,
        handlers::prestadores::update_prestador,
        handlers::prestadores::delete_prestador,
        handlers::prestadores::update_status_contrato,
        handlers::prestadores::toggle_prestador,
        handlers::prestadores::avaliar_prestador,
        handlers::prestadores::incrementar_servicos,
        handlers::prestadores::list_by_status,
        handlers::prestadores::list_com_urgencia,
        handlers::prestadores::list_com_24x7,
        handlers::prestadores::get_estatisticas,
        handlers::prestadores::list_contratos_vencendo,
        handlers::prestadores::list_renovacoes_automaticas,

        // --- Categorias de Prestadores ---
        handlers::categorias::create_categoria,
        handlers::categorias::list_categorias,
        handlers::categorias::list_categorias_ativas,
        handlers::categorias::get_categoria,
        handlers::categorias::update_categoria,
        handlers::categorias::delete_categoria,
        handlers::categorias::toggle_categoria,
        handlers::categorias::list_by_tipo,
        handlers::categorias::list_prestadores_do_tipo,
        handlers::categorias::get_estatisticas_por_tipo,
        handlers::categorias::list_by_prestador,
        handlers::categorias::list_ativas_by_prestador,
        handlers::categorias::get_estatisticas_prestador,
        handlers::categorias::importar_categorias,

        // --- Telemedicina ---
        handlers::telemedicina::create_telemedicina,
        handlers::telemedicina::list_telemedicinas,
        handlers::telemedicina::list_telemedicinas_ativas,
        handlers::telemedicina::search_telemedicinas,
        handlers::telemedicina::get_telemedicina_by_codigo,
        handlers::telemedicina::get_telemedicina_by_cnpj,
        handlers::telemedicina::get_telemedicina,
        handlers::telemedicina::update_telemedicina,
        handlers::telemedicina::delete_telemedicina,
        handlers::telemedicina::toggle_telemedicina,

        // --- Telemedicina x Exames ---
        handlers::telemedicina_exames::create_mapeamento,
        handlers::telemedicina_exames::list_mapeamentos,
        handlers::telemedicina_exames::list_mapeamentos_ativos,
        handlers::telemedicina_exames::get_estatisticas,
        handlers::telemedicina_exames::list_by_exame,
        handlers::telemedicina_exames::get_mapeamento,
        handlers::telemedicina_exames::update_mapeamento,
        handlers::telemedicina_exames::delete_mapeamento,
        handlers::telemedicina_exames::toggle_mapeamento,
        handlers::telemedicina_exames::list_by_telemedicina,
        handlers::telemedicina_exames::list_sem_vinculo,
        handlers::telemedicina_exames::vincular_automaticamente,
        handlers::telemedicina_exames::search_mapeamentos,

        // --- Contas a Pagar ---
        handlers::contas_pagar::create_conta,
        handlers::contas_pagar::list_contas,
        handlers::contas_pagar::list_by_status,
        handlers::contas_pagar::list_by_credor,
        handlers::contas_pagar::get_conta,
        handlers::contas_pagar::update_conta,
        handlers::contas_pagar::update_status_conta,
        handlers::contas_pagar::delete_conta,
        handlers::contas_pagar::registrar_pagamento,
        handlers::contas_pagar::add_anexo,
        handlers::contas_pagar::list_anexos,

        // --- Convênios ---
        handlers::convenios::create_convenio,
        handlers::convenios::list_convenios,
        handlers::convenios::list_convenios_ativos,
        handlers::convenios::search_convenios,
        handlers::convenios::get_convenio_by_cnpj,
        handlers::convenios::get_convenio,
        handlers::convenios::update_convenio,
        handlers::convenios::delete_convenio,
        handlers::convenios::toggle_convenio,

        // --- Formulários ---
        handlers::formularios::create_formulario,
        handlers::formularios::list_formularios,
        handlers::formularios::list_formularios_ativos,
        handlers::formularios::list_formularios_publicados,
        handlers::formularios::search_formularios,
        handlers::formularios::estatisticas_formularios,
        handlers::formularios::get_formulario_by_codigo,
        handlers::formularios::get_formulario,
        handlers::formularios::update_formulario,
        handlers::formularios::delete_formulario,
        handlers::formularios::toggle_formulario,
        handlers::formularios::update_status_formulario,
        handlers::formularios::publicar_formulario,
        handlers::formularios::criar_versao_formulario,
        handlers::formularios::validar_formulario,
    ),
    components(
        schemas(
            // --- Empresa ---
            models::empresa::TipoEmpresa,
            models::empresa::Empresa,
            models::empresa::DadosEmpresa,
            models::empresa::AtualizarEmpresa,

            // --- Exames ---
            models::exame::CategoriaExame,
            models::exame::StatusCadastro,
            models::exame::Exame,
            models::exame::ExameDetalhe,
            models::exame::CriarExamePayload,
            models::exame::AtualizarExamePayload,
            models::exame::AtualizarStatusEmLotePayload,
            models::exame_unidade::DestinoExame,
            models::exame_unidade::ExameUnidade,
            models::exame_unidade::VincularUnidadePayload,
            models::exame_unidade::AtualizarUnidadePayload,

            // --- Laboratórios de apoio ---
            models::laboratorio_apoio::FormaEnvio,
            models::laboratorio_apoio::PeriodicidadeFaturamento,
            models::laboratorio_apoio::LaboratorioApoio,
            models::laboratorio_apoio::CriarLaboratorioPayload,
            models::laboratorio_apoio::AtualizarLaboratorioPayload,
            models::laboratorio_apoio::ExameLaboratorioApoio,
            models::laboratorio_apoio::CriarExameLaboratorioPayload,
            models::laboratorio_apoio::AtualizarExameLaboratorioPayload,
            models::laboratorio_apoio::CriarLotePayload,
            models::laboratorio_apoio::ErroLote,
            models::laboratorio_apoio::ResultadoLote,

            // --- Ordens de serviço ---
            models::ordem_servico::StatusExameOs,
            models::ordem_servico::OrdemServicoExame,
            models::ordem_servico::OrdemServicoExameResposta,
            models::ordem_servico::AdicionarExameOsPayload,
            models::ordem_servico::AtualizarStatusOsPayload,
            models::ordem_servico::ClassificacaoResultado,
            models::ordem_servico::ResultadoExame,
            models::ordem_servico::RegistrarResultadoPayload,
            models::ordem_servico::RevisarResultadoPayload,

            // --- Prestadores ---
            models::prestador::TipoContrato,
            models::prestador::FormaPagamentoPrestador,
            models::prestador::StatusContrato,
            models::prestador::PrestadorServico,
            models::prestador::PrestadorComEmpresa,
            models::prestador::CriarPrestadorPayload,
            models::prestador::AtualizarPrestadorPayload,
            models::prestador::AtualizarStatusContratoPayload,
            models::prestador::AvaliarPayload,
            models::prestador::ResumoPrestadores,
            models::prestador::EstatisticasPrestadores,

            // --- Categorias ---
            models::prestador::TipoServicoCategoria,
            models::prestador::PrestadorServicoCategoria,
            models::prestador::CriarCategoriaPayload,
            models::prestador::AtualizarCategoriaPayload,
            models::prestador::ImportarCategoriaItem,
            models::prestador::ImportarCategoriasPayload,
            models::prestador::EstatisticaTipo,
            models::prestador::ResumoCategoriasPrestador,
            models::prestador::PorTipoPrestador,
            models::prestador::EstatisticasCategoriasPrestador,
            models::prestador::PrestadorDaCategoria,

            // --- Telemedicina ---
            models::telemedicina::TipoIntegracao,
            models::telemedicina::StatusIntegracao,
            models::telemedicina::TipoPlataforma,
            models::telemedicina::Telemedicina,
            models::telemedicina::TelemedicinaComEmpresa,
            models::telemedicina::CriarTelemedicinaPayload,
            models::telemedicina::AtualizarTelemedicinaPayload,
            models::telemedicina::TelemedicinaExame,
            models::telemedicina::CriarTelemedicinaExamePayload,
            models::telemedicina::AtualizarTelemedicinaExamePayload,
            models::telemedicina::ResultadoVinculacao,
            models::telemedicina::EstatisticasTelemedicinaExame,

            // --- Contas a pagar ---
            models::conta_pagar::CredorTipo,
            models::conta_pagar::TipoDocumento,
            models::conta_pagar::StatusContaPagar,
            models::conta_pagar::StatusParcela,
            models::conta_pagar::FormaPagamentoParcela,
            models::conta_pagar::TipoImposto,
            models::conta_pagar::TipoAnexo,
            models::conta_pagar::ContaPagar,
            models::conta_pagar::Parcela,
            models::conta_pagar::PagamentoParcela,
            models::conta_pagar::ImpostoRetido,
            models::conta_pagar::ComposicaoFinanceira,
            models::conta_pagar::AnexoContaPagar,
            models::conta_pagar::ContaPagarDetalhe,
            models::conta_pagar::ImpostoRetidoPayload,
            models::conta_pagar::ComposicaoFinanceiraPayload,
            models::conta_pagar::ParcelaPayload,
            models::conta_pagar::CriarContaPagarPayload,
            models::conta_pagar::AtualizarContaPagarPayload,
            models::conta_pagar::AtualizarStatusContaPayload,
            models::conta_pagar::RegistrarPagamentoPayload,
            models::conta_pagar::AdicionarAnexoPayload,

            // --- Convênios ---
            models::convenio::Convenio,
            models::convenio::ConvenioComEmpresa,
            models::convenio::CriarConvenioPayload,
            models::convenio::AtualizarConvenioPayload,

            // --- Formulários ---
            models::formulario::TipoFormulario,
            models::formulario::StatusFormulario,
            models::formulario::CategoriaFormulario,
            models::formulario::TipoCampo,
            models::formulario::CampoFormulario,
            models::formulario::Formulario,
            models::formulario::CriarFormularioPayload,
            models::formulario::AtualizarFormularioPayload,
            models::formulario::AlterarStatusFormularioPayload,
            models::formulario::ResultadoValidacao,
            models::formulario::EstatisticasFormularios,
        )
    ),
    tags(
        (name = "Exames", description = "Cadastro de Exames e vínculo com Unidades"),
        (name = "Laboratórios de Apoio", description = "Laboratórios externos"),
        (name = "Exames x Laboratórios", description = "Configuração de exames por laboratório de apoio"),
        (name = "Ordens de Serviço", description = "Exames da OS e Resultados"),
        (name = "Prestadores de Serviço", description = "Prestadores e Contratos"),
        (name = "Categorias de Prestadores", description = "Serviços oferecidos por prestador"),
        (name = "Telemedicina", description = "Parceiros de Telemedicina"),
        (name = "Telemedicina x Exames", description = "Mapeamento de exames nas plataformas"),
        (name = "Contas a Pagar", description = "Títulos, Parcelas e Pagamentos"),
        (name = "Convênios", description = "Operadoras de planos de saúde"),
        (name = "Formulários", description = "Formulários configuráveis, publicação e versões")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documenta_rotas_e_esquema_jwt() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/exames/{id}"));
        assert!(doc.paths.paths.contains_key("/api/contas-pagar/parcelas/{id}/pagamento"));
        assert!(doc.paths.paths.contains_key("/api/convenios/{id}/toggle-status"));
        assert!(doc.paths.paths.contains_key("/api/formularios/{id}/publicar"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
