// src/db/memory.rs
//
// Repositórios em memória para os testes dos serviços. Um único `MemoryStore`
// implementa todos os traits, então um teste enxerga o mesmo "banco" por
// qualquer repositório. As restrições de unicidade das migrações são
// reproduzidas aqui.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        conta_pagar_repo::ContaPagarRepository,
        convenio_repo::ConvenioRepository,
        empresa_repo::EmpresaRepository,
        exame_repo::ExameRepository,
        exame_unidade_repo::ExameUnidadeRepository,
        formulario_repo::{FormularioRepository, MSG_CODIGO_DUPLICADO as MSG_FORMULARIO_DUPLICADO},
        laboratorio_apoio_repo::{ExameLaboratorioApoioRepository, LaboratorioApoioRepository},
        ordem_servico_repo::OrdemServicoRepository,
        prestador_repo::{CategoriaRepository, PrestadorRepository},
        telemedicina_repo::{TelemedicinaExameRepository, TelemedicinaRepository},
    },
    models::{
        conta_pagar::{
            AnexoContaPagar, ComposicaoFinanceira, ContaPagar, ContaPagarDetalhe, FiltroContas,
            ImpostoRetido, NovaContaPagar, PagamentoParcela, Parcela, sequencia_do_codigo,
        },
        convenio::{Convenio, ConvenioComEmpresa},
        empresa::{fixtures::dados_empresa, Empresa, TipoEmpresa},
        exame::{CriarExamePayload, Exame, FiltroExames, OrdemExames, StatusCadastro},
        exame_unidade::ExameUnidade,
        formulario::{FiltroFormularios, Formulario},
        laboratorio_apoio::{CriarLaboratorioPayload, ExameLaboratorioApoio, FiltroLaboratorios, LaboratorioApoio},
        ordem_servico::{OrdemServicoExame, ResultadoExame},
        prestador::{
            FiltroCategorias, PrestadorComEmpresa, PrestadorServico, PrestadorServicoCategoria,
            TipoServicoCategoria,
        },
        telemedicina::{
            CriarTelemedicinaPayload, FiltroTelemedicinaExame, Telemedicina, TelemedicinaComEmpresa, TelemedicinaExame,
        },
    },
};

#[derive(Default)]
pub struct MemoryStore {
    pub exames: Mutex<Vec<Exame>>,
    pub exames_unidades: Mutex<Vec<ExameUnidade>>,
    pub laboratorios: Mutex<Vec<LaboratorioApoio>>,
    pub exames_laboratorios: Mutex<Vec<ExameLaboratorioApoio>>,
    pub os_exames: Mutex<Vec<OrdemServicoExame>>,
    pub resultados: Mutex<Vec<ResultadoExame>>,
    pub empresas: Mutex<Vec<Empresa>>,
    pub prestadores: Mutex<Vec<PrestadorServico>>,
    pub categorias: Mutex<Vec<PrestadorServicoCategoria>>,
    pub telemedicinas: Mutex<Vec<Telemedicina>>,
    pub telemedicina_exames: Mutex<Vec<TelemedicinaExame>>,
    pub convenios: Mutex<Vec<Convenio>>,
    pub formularios: Mutex<Vec<Formulario>>,
    pub contas: Mutex<Vec<ContaPagar>>,
    pub parcelas: Mutex<Vec<Parcela>>,
    pub impostos: Mutex<Vec<ImpostoRetido>>,
    pub composicoes: Mutex<Vec<ComposicaoFinanceira>>,
    pub pagamentos: Mutex<Vec<PagamentoParcela>>,
    pub anexos: Mutex<Vec<AnexoContaPagar>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().expect("mutex do repositório em memória envenenado")
}

fn conflito(msg: &str) -> AppError {
    AppError::Conflict(msg.to_string())
}

// Substitui a linha de mesmo id (UPDATE ... WHERE id = $1).
fn substituir<T: Clone>(linhas: &mut [T], novo: &T, id: impl Fn(&T) -> Uuid) {
    if let Some(l) = linhas.iter_mut().find(|l| id(l) == id(novo)) {
        *l = novo.clone();
    }
}

fn paginar<T>(linhas: Vec<T>, limit: Option<i64>, offset: i64) -> (Vec<T>, i64) {
    let total = linhas.len() as i64;
    let pagina = linhas
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX))
        .collect();
    (pagina, total)
}

impl MemoryStore {
    fn empresa_de(&self, id: Uuid) -> Option<Empresa> {
        lock(&self.empresas).iter().find(|e| e.id == id).cloned()
    }

    fn inserir_empresa(&self, empresa: &Empresa) -> Result<(), AppError> {
        let mut empresas = lock(&self.empresas);
        if empresas.iter().any(|e| e.tenant_id == empresa.tenant_id && e.cnpj == empresa.cnpj) {
            return Err(conflito("Já existe uma empresa cadastrada com este CNPJ"));
        }
        empresas.push(empresa.clone());
        Ok(())
    }

    fn com_empresa(&self, p: PrestadorServico) -> Option<PrestadorComEmpresa> {
        self.empresa_de(p.empresa_id)
            .map(|empresa| PrestadorComEmpresa { prestador: p, empresa })
    }

    fn tele_com_empresa(&self, t: Telemedicina) -> Option<TelemedicinaComEmpresa> {
        self.empresa_de(t.empresa_id)
            .map(|empresa| TelemedicinaComEmpresa { telemedicina: t, empresa })
    }

    fn convenio_com_empresa(&self, c: Convenio) -> Option<ConvenioComEmpresa> {
        self.empresa_de(c.empresa_id)
            .map(|empresa| ConvenioComEmpresa { convenio: c, empresa })
    }
}

// --- Registros de apoio para os testes ---

impl MemoryStore {
    pub fn semear_exame(&self, tenant_id: Uuid, codigo: &str) -> Uuid {
        let exame = Exame::novo(
            tenant_id,
            CriarExamePayload { codigo_interno: codigo.into(), nome: format!("Exame {}", codigo), ..Default::default() },
            None,
        );
        let id = exame.id;
        lock(&self.exames).push(exame);
        id
    }

    pub fn semear_laboratorio(&self, tenant_id: Uuid, codigo: &str) -> Uuid {
        let lab = LaboratorioApoio::novo(
            tenant_id,
            CriarLaboratorioPayload { codigo: codigo.into(), nome: format!("Laboratório {}", codigo), ..Default::default() },
        );
        let id = lab.id;
        lock(&self.laboratorios).push(lab);
        id
    }

    pub fn semear_telemedicina(&self, tenant_id: Uuid, codigo: &str) -> Uuid {
        let dados = CriarTelemedicinaPayload {
            empresa: dados_empresa(&format!("CNPJ-{}", codigo), &format!("Tele {} S.A.", codigo), None),
            codigo_telemedicina: codigo.into(),
            tipo_integracao: None,
            url_integracao: None,
            status_integracao: None,
            tipo_plataforma: None,
            url_plataforma: None,
            teleconsulta: None,
            telediagnostico: None,
            telemonitoramento: None,
            tempo_consulta_padrao: None,
            valor_consulta_particular: None,
            percentual_repasse: None,
            integracao_id: None,
            observacoes: None,
        };
        let empresa = Empresa::nova(tenant_id, TipoEmpresa::Telemedicina, dados.empresa.clone());
        let telemedicina = Telemedicina::nova(tenant_id, empresa.id, &dados);
        let id = telemedicina.id;
        lock(&self.empresas).push(empresa);
        lock(&self.telemedicinas).push(telemedicina);
        id
    }
}

// --- Exames ---

#[async_trait]
impl ExameRepository for MemoryStore {
    async fn insert(&self, exame: &Exame, unidades: &[ExameUnidade]) -> Result<(), AppError> {
        let mut exames = lock(&self.exames);
        let mut vinculos = lock(&self.exames_unidades);

        if exames
            .iter()
            .any(|e| e.tenant_id == exame.tenant_id && e.codigo_interno == exame.codigo_interno)
        {
            return Err(conflito("Já existe um exame com este código interno"));
        }
        for (i, u) in unidades.iter().enumerate() {
            let repetida = unidades[..i].iter().any(|o| o.unidade_id == u.unidade_id)
                || vinculos.iter().any(|v| v.exame_id == u.exame_id && v.unidade_id == u.unidade_id);
            if repetida {
                return Err(conflito("Exame já vinculado a esta unidade"));
            }
        }

        exames.push(exame.clone());
        vinculos.extend(unidades.iter().cloned());
        Ok(())
    }

    async fn update(&self, exame: &Exame) -> Result<(), AppError> {
        let mut exames = lock(&self.exames);
        if exames.iter().any(|e| {
            e.id != exame.id && e.tenant_id == exame.tenant_id && e.codigo_interno == exame.codigo_interno
        }) {
            return Err(conflito("Já existe um exame com este código interno"));
        }
        substituir(&mut exames, exame, |e| e.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Exame>, AppError> {
        Ok(lock(&self.exames)
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.id == id)
            .cloned())
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<Exame>, AppError> {
        Ok(lock(&self.exames)
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.codigo_interno == codigo)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroExames,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<Exame>, i64), AppError> {
        let mut exames: Vec<Exame> = lock(&self.exames)
            .iter()
            .filter(|e| e.tenant_id == tenant_id && filtro.aceita(e))
            .cloned()
            .collect();
        match filtro.ordem {
            OrdemExames::Nome => exames.sort_by(|a, b| a.nome.cmp(&b.nome)),
            OrdemExames::PesoDesc => {
                exames.sort_by(|a, b| b.peso.cmp(&a.peso).then_with(|| a.nome.cmp(&b.nome)))
            }
        }
        Ok(paginar(exames, limit, offset))
    }

    async fn update_status_many(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: StatusCadastro,
    ) -> Result<u64, AppError> {
        let mut alterados = 0;
        for e in lock(&self.exames)
            .iter_mut()
            .filter(|e| e.tenant_id == tenant_id && ids.contains(&e.id))
        {
            e.status = status;
            alterados += 1;
        }
        Ok(alterados)
    }
}

#[async_trait]
impl ExameUnidadeRepository for MemoryStore {
    async fn insert(&self, vinculo: &ExameUnidade) -> Result<(), AppError> {
        let mut vinculos = lock(&self.exames_unidades);
        if vinculos
            .iter()
            .any(|v| v.exame_id == vinculo.exame_id && v.unidade_id == vinculo.unidade_id)
        {
            return Err(conflito("Exame já vinculado a esta unidade"));
        }
        vinculos.push(vinculo.clone());
        Ok(())
    }

    async fn update(&self, vinculo: &ExameUnidade) -> Result<(), AppError> {
        substituir(&mut lock(&self.exames_unidades), vinculo, |v| v.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ExameUnidade>, AppError> {
        Ok(lock(&self.exames_unidades)
            .iter()
            .find(|v| v.tenant_id == tenant_id && v.id == id)
            .cloned())
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        unidade_id: Uuid,
    ) -> Result<Option<ExameUnidade>, AppError> {
        Ok(lock(&self.exames_unidades)
            .iter()
            .find(|v| v.tenant_id == tenant_id && v.exame_id == exame_id && v.unidade_id == unidade_id)
            .cloned())
    }

    async fn list_by_exame(&self, tenant_id: Uuid, exame_id: Uuid) -> Result<Vec<ExameUnidade>, AppError> {
        Ok(lock(&self.exames_unidades)
            .iter()
            .filter(|v| v.tenant_id == tenant_id && v.exame_id == exame_id)
            .cloned()
            .collect())
    }

    async fn list_by_unidade(&self, tenant_id: Uuid, unidade_id: Uuid) -> Result<Vec<ExameUnidade>, AppError> {
        Ok(lock(&self.exames_unidades)
            .iter()
            .filter(|v| v.tenant_id == tenant_id && v.unidade_id == unidade_id)
            .cloned()
            .collect())
    }

    async fn list_ativos_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameUnidade>, AppError> {
        Ok(lock(&self.exames_unidades)
            .iter()
            .filter(|v| {
                v.tenant_id == tenant_id && v.ativo && v.laboratorio_apoio_id == Some(laboratorio_apoio_id)
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut vinculos = lock(&self.exames_unidades);
        let antes = vinculos.len();
        vinculos.retain(|v| !(v.tenant_id == tenant_id && v.id == id));
        Ok(vinculos.len() < antes)
    }
}

// --- Laboratórios de apoio ---

#[async_trait]
impl LaboratorioApoioRepository for MemoryStore {
    async fn insert(&self, lab: &LaboratorioApoio) -> Result<(), AppError> {
        let mut labs = lock(&self.laboratorios);
        if labs.iter().any(|l| l.tenant_id == lab.tenant_id && l.codigo == lab.codigo) {
            return Err(conflito("Já existe um laboratório de apoio com este código"));
        }
        labs.push(lab.clone());
        Ok(())
    }

    async fn update(&self, lab: &LaboratorioApoio) -> Result<(), AppError> {
        let mut labs = lock(&self.laboratorios);
        if labs
            .iter()
            .any(|l| l.id != lab.id && l.tenant_id == lab.tenant_id && l.codigo == lab.codigo)
        {
            return Err(conflito("Já existe um laboratório de apoio com este código"));
        }
        substituir(&mut labs, lab, |l| l.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<LaboratorioApoio>, AppError> {
        Ok(lock(&self.laboratorios)
            .iter()
            .find(|l| l.tenant_id == tenant_id && l.id == id)
            .cloned())
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<LaboratorioApoio>, AppError> {
        Ok(lock(&self.laboratorios)
            .iter()
            .find(|l| l.tenant_id == tenant_id && l.codigo == codigo)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroLaboratorios,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<LaboratorioApoio>, i64), AppError> {
        let mut labs: Vec<LaboratorioApoio> = lock(&self.laboratorios)
            .iter()
            .filter(|l| l.tenant_id == tenant_id && filtro.aceita(l))
            .cloned()
            .collect();
        labs.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(paginar(labs, limit, offset))
    }
}

#[async_trait]
impl ExameLaboratorioApoioRepository for MemoryStore {
    async fn insert(&self, config: &ExameLaboratorioApoio) -> Result<(), AppError> {
        let mut configs = lock(&self.exames_laboratorios);
        if configs.iter().any(|c| {
            c.exame_id == config.exame_id && c.laboratorio_apoio_id == config.laboratorio_apoio_id
        }) {
            return Err(conflito("Este exame já está configurado para este laboratório de apoio"));
        }
        configs.push(config.clone());
        Ok(())
    }

    async fn insert_lote(
        &self,
        itens: &[ExameLaboratorioApoio],
    ) -> Result<Vec<Result<(), AppError>>, AppError> {
        let mut resultados = Vec::with_capacity(itens.len());
        for item in itens {
            resultados.push(ExameLaboratorioApoioRepository::insert(self, item).await);
        }
        Ok(resultados)
    }

    async fn update(&self, config: &ExameLaboratorioApoio) -> Result<(), AppError> {
        let mut configs = lock(&self.exames_laboratorios);
        if configs.iter().any(|c| {
            c.id != config.id
                && c.exame_id == config.exame_id
                && c.laboratorio_apoio_id == config.laboratorio_apoio_id
        }) {
            return Err(conflito("Este exame já está configurado para este laboratório de apoio"));
        }
        substituir(&mut configs, config, |c| c.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ExameLaboratorioApoio>, AppError> {
        Ok(lock(&self.exames_laboratorios)
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == id)
            .cloned())
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Option<ExameLaboratorioApoio>, AppError> {
        Ok(lock(&self.exames_laboratorios)
            .iter()
            .find(|c| {
                c.tenant_id == tenant_id
                    && c.exame_id == exame_id
                    && c.laboratorio_apoio_id == laboratorio_apoio_id
            })
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        exame_id: Option<Uuid>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<ExameLaboratorioApoio>, i64), AppError> {
        let mut configs: Vec<ExameLaboratorioApoio> = lock(&self.exames_laboratorios)
            .iter()
            .filter(|c| c.tenant_id == tenant_id && exame_id.is_none_or(|id| id == c.exame_id))
            .cloned()
            .collect();
        configs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginar(configs, limit, offset))
    }

    async fn list_ativos_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameLaboratorioApoio>, AppError> {
        Ok(lock(&self.exames_laboratorios)
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.ativo && c.laboratorio_apoio_id == laboratorio_apoio_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut configs = lock(&self.exames_laboratorios);
        let antes = configs.len();
        configs.retain(|c| !(c.tenant_id == tenant_id && c.id == id));
        Ok(configs.len() < antes)
    }
}

// --- Ordens de serviço ---

#[async_trait]
impl OrdemServicoRepository for MemoryStore {
    async fn insert(&self, exame: &OrdemServicoExame) -> Result<(), AppError> {
        lock(&self.os_exames).push(exame.clone());
        Ok(())
    }

    async fn update(&self, exame: &OrdemServicoExame) -> Result<(), AppError> {
        substituir(&mut lock(&self.os_exames), exame, |e| e.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<OrdemServicoExame>, AppError> {
        Ok(lock(&self.os_exames)
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.id == id)
            .cloned())
    }

    async fn list_by_ordem(&self, tenant_id: Uuid, ordem_servico_id: Uuid) -> Result<Vec<OrdemServicoExame>, AppError> {
        let mut exames: Vec<OrdemServicoExame> = lock(&self.os_exames)
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.ordem_servico_id == ordem_servico_id)
            .cloned()
            .collect();
        exames.sort_by(|a, b| b.is_urgente.cmp(&a.is_urgente).then(a.created_at.cmp(&b.created_at)));
        Ok(exames)
    }

    async fn insert_resultado(&self, resultado: &ResultadoExame) -> Result<(), AppError> {
        lock(&self.resultados).push(resultado.clone());
        Ok(())
    }

    async fn update_resultado(&self, resultado: &ResultadoExame) -> Result<(), AppError> {
        substituir(&mut lock(&self.resultados), resultado, |r| r.id);
        Ok(())
    }

    async fn find_resultado(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ResultadoExame>, AppError> {
        Ok(lock(&self.resultados)
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.id == id)
            .cloned())
    }

    async fn list_resultados(
        &self,
        tenant_id: Uuid,
        ordem_servico_exame_id: Uuid,
    ) -> Result<Vec<ResultadoExame>, AppError> {
        Ok(lock(&self.resultados)
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.ordem_servico_exame_id == ordem_servico_exame_id)
            .cloned()
            .collect())
    }
}

// --- Empresas, prestadores e categorias ---

#[async_trait]
impl EmpresaRepository for MemoryStore {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Empresa>, AppError> {
        Ok(self.empresa_de(id).filter(|e| e.tenant_id == tenant_id))
    }

    async fn find_by_cnpj(&self, tenant_id: Uuid, cnpj: &str) -> Result<Option<Empresa>, AppError> {
        Ok(lock(&self.empresas)
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.cnpj == cnpj)
            .cloned())
    }

    async fn update(&self, empresa: &Empresa) -> Result<(), AppError> {
        let mut empresas = lock(&self.empresas);
        if empresas
            .iter()
            .any(|e| e.id != empresa.id && e.tenant_id == empresa.tenant_id && e.cnpj == empresa.cnpj)
        {
            return Err(conflito("Já existe uma empresa cadastrada com este CNPJ"));
        }
        substituir(&mut empresas, empresa, |e| e.id);
        Ok(())
    }
}

#[async_trait]
impl PrestadorRepository for MemoryStore {
    async fn insert(&self, prestador: &PrestadorServico, empresa: &Empresa) -> Result<(), AppError> {
        if lock(&self.prestadores).iter().any(|p| {
            p.tenant_id == prestador.tenant_id && p.codigo_prestador == prestador.codigo_prestador
        }) {
            return Err(conflito("Já existe um prestador de serviço com este código"));
        }
        self.inserir_empresa(empresa)?;
        lock(&self.prestadores).push(prestador.clone());
        Ok(())
    }

    async fn update(&self, prestador: &PrestadorServico, empresa: &Empresa) -> Result<(), AppError> {
        EmpresaRepository::update(self, empresa).await?;
        PrestadorRepository::update_prestador(self, prestador).await
    }

    async fn update_prestador(&self, prestador: &PrestadorServico) -> Result<(), AppError> {
        let mut prestadores = lock(&self.prestadores);
        if prestadores.iter().any(|p| {
            p.id != prestador.id
                && p.tenant_id == prestador.tenant_id
                && p.codigo_prestador == prestador.codigo_prestador
        }) {
            return Err(conflito("Já existe um prestador de serviço com este código"));
        }
        substituir(&mut prestadores, prestador, |p| p.id);
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid, empresa_id: Uuid) -> Result<bool, AppError> {
        let mut prestadores = lock(&self.prestadores);
        let antes = prestadores.len();
        prestadores.retain(|p| !(p.tenant_id == tenant_id && p.id == id));
        let removido = prestadores.len() < antes;

        lock(&self.categorias).retain(|c| c.prestador_servico_id != id);
        lock(&self.empresas).retain(|e| !(e.tenant_id == tenant_id && e.id == empresa_id));
        Ok(removido)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<PrestadorComEmpresa>, AppError> {
        let p = lock(&self.prestadores)
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.id == id)
            .cloned();
        Ok(p.and_then(|p| self.com_empresa(p)))
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<PrestadorComEmpresa>, AppError> {
        let p = lock(&self.prestadores)
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.codigo_prestador == codigo)
            .cloned();
        Ok(p.and_then(|p| self.com_empresa(p)))
    }

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<PrestadorComEmpresa>, AppError> {
        let p = lock(&self.prestadores)
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.empresa_id == empresa_id)
            .cloned();
        Ok(p.and_then(|p| self.com_empresa(p)))
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        let prestadores: Vec<PrestadorServico> = lock(&self.prestadores)
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(prestadores.into_iter().filter_map(|p| self.com_empresa(p)).collect())
    }
}

#[async_trait]
impl CategoriaRepository for MemoryStore {
    async fn insert(&self, categoria: &PrestadorServicoCategoria) -> Result<(), AppError> {
        let mut categorias = lock(&self.categorias);
        if categorias.iter().any(|c| {
            c.prestador_servico_id == categoria.prestador_servico_id && c.tipo_servico == categoria.tipo_servico
        }) {
            return Err(conflito("Prestador já possui uma categoria deste tipo de serviço"));
        }
        categorias.push(categoria.clone());
        Ok(())
    }

    async fn update(&self, categoria: &PrestadorServicoCategoria) -> Result<(), AppError> {
        let mut categorias = lock(&self.categorias);
        if categorias.iter().any(|c| {
            c.id != categoria.id
                && c.prestador_servico_id == categoria.prestador_servico_id
                && c.tipo_servico == categoria.tipo_servico
        }) {
            return Err(conflito("Prestador já possui uma categoria deste tipo de serviço"));
        }
        substituir(&mut categorias, categoria, |c| c.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<PrestadorServicoCategoria>, AppError> {
        Ok(lock(&self.categorias)
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == id)
            .cloned())
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        prestador_id: Uuid,
        tipo_servico: TipoServicoCategoria,
    ) -> Result<Option<PrestadorServicoCategoria>, AppError> {
        Ok(lock(&self.categorias)
            .iter()
            .find(|c| {
                c.tenant_id == tenant_id && c.prestador_servico_id == prestador_id && c.tipo_servico == tipo_servico
            })
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroCategorias,
    ) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        let mut categorias: Vec<PrestadorServicoCategoria> = lock(&self.categorias)
            .iter()
            .filter(|c| c.tenant_id == tenant_id && filtro.aceita(c))
            .cloned()
            .collect();
        categorias.sort_by(|a, b| a.tipo_servico.cmp(&b.tipo_servico).then(a.created_at.cmp(&b.created_at)));
        Ok(categorias)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut categorias = lock(&self.categorias);
        let antes = categorias.len();
        categorias.retain(|c| !(c.tenant_id == tenant_id && c.id == id));
        Ok(categorias.len() < antes)
    }

    async fn delete_by_prestador(&self, tenant_id: Uuid, prestador_id: Uuid) -> Result<u64, AppError> {
        let mut categorias = lock(&self.categorias);
        let antes = categorias.len();
        categorias.retain(|c| !(c.tenant_id == tenant_id && c.prestador_servico_id == prestador_id));
        Ok((antes - categorias.len()) as u64)
    }
}

// --- Telemedicina ---

#[async_trait]
impl TelemedicinaRepository for MemoryStore {
    async fn insert(&self, telemedicina: &Telemedicina, empresa: &Empresa) -> Result<(), AppError> {
        if lock(&self.telemedicinas).iter().any(|t| {
            t.tenant_id == telemedicina.tenant_id && t.codigo_telemedicina == telemedicina.codigo_telemedicina
        }) {
            return Err(conflito("Já existe uma telemedicina com este código"));
        }
        self.inserir_empresa(empresa)?;
        lock(&self.telemedicinas).push(telemedicina.clone());
        Ok(())
    }

    async fn update(&self, telemedicina: &Telemedicina) -> Result<(), AppError> {
        substituir(&mut lock(&self.telemedicinas), telemedicina, |t| t.id);
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut registros = lock(&self.telemedicinas);
        let antes = registros.len();
        registros.retain(|t| !(t.tenant_id == tenant_id && t.id == id));
        lock(&self.telemedicina_exames).retain(|v| v.telemedicina_id != id);
        Ok(registros.len() < antes)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        let t = lock(&self.telemedicinas)
            .iter()
            .find(|t| t.tenant_id == tenant_id && t.id == id)
            .cloned();
        Ok(t.and_then(|t| self.tele_com_empresa(t)))
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        let t = lock(&self.telemedicinas)
            .iter()
            .find(|t| t.tenant_id == tenant_id && t.codigo_telemedicina == codigo)
            .cloned();
        Ok(t.and_then(|t| self.tele_com_empresa(t)))
    }

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        let t = lock(&self.telemedicinas)
            .iter()
            .find(|t| t.tenant_id == tenant_id && t.empresa_id == empresa_id)
            .cloned();
        Ok(t.and_then(|t| self.tele_com_empresa(t)))
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaComEmpresa>, AppError> {
        let registros: Vec<Telemedicina> = lock(&self.telemedicinas)
            .iter()
            .filter(|t| t.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(registros.into_iter().filter_map(|t| self.tele_com_empresa(t)).collect())
    }
}

#[async_trait]
impl TelemedicinaExameRepository for MemoryStore {
    async fn insert(&self, vinculo: &TelemedicinaExame) -> Result<(), AppError> {
        let mut vinculos = lock(&self.telemedicina_exames);
        if vinculos
            .iter()
            .any(|v| v.telemedicina_id == vinculo.telemedicina_id && v.exame_id == vinculo.exame_id)
        {
            return Err(conflito("Este exame já está vinculado a esta telemedicina"));
        }
        vinculos.push(vinculo.clone());
        Ok(())
    }

    async fn update(&self, vinculo: &TelemedicinaExame) -> Result<(), AppError> {
        let mut vinculos = lock(&self.telemedicina_exames);
        if vinculos.iter().any(|v| {
            v.id != vinculo.id && v.telemedicina_id == vinculo.telemedicina_id && v.exame_id == vinculo.exame_id
        }) {
            return Err(conflito("Este exame já está vinculado a esta telemedicina"));
        }
        substituir(&mut vinculos, vinculo, |v| v.id);
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<TelemedicinaExame>, AppError> {
        Ok(lock(&self.telemedicina_exames)
            .iter()
            .find(|v| v.tenant_id == tenant_id && v.id == id)
            .cloned())
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        telemedicina_id: Uuid,
        exame_id: Uuid,
    ) -> Result<Option<TelemedicinaExame>, AppError> {
        Ok(lock(&self.telemedicina_exames)
            .iter()
            .find(|v| v.tenant_id == tenant_id && v.telemedicina_id == telemedicina_id && v.exame_id == exame_id)
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroTelemedicinaExame,
    ) -> Result<Vec<TelemedicinaExame>, AppError> {
        Ok(lock(&self.telemedicina_exames)
            .iter()
            .filter(|v| v.tenant_id == tenant_id && filtro.aceita(v))
            .cloned()
            .collect())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut vinculos = lock(&self.telemedicina_exames);
        let antes = vinculos.len();
        vinculos.retain(|v| !(v.tenant_id == tenant_id && v.id == id));
        Ok(vinculos.len() < antes)
    }
}

// --- Convênios ---

#[async_trait]
impl ConvenioRepository for MemoryStore {
    async fn insert(&self, convenio: &Convenio, empresa: &Empresa) -> Result<(), AppError> {
        self.inserir_empresa(empresa)?;
        lock(&self.convenios).push(convenio.clone());
        Ok(())
    }

    async fn update(&self, convenio: &Convenio) -> Result<(), AppError> {
        substituir(&mut lock(&self.convenios), convenio, |c| c.id);
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut registros = lock(&self.convenios);
        let antes = registros.len();
        registros.retain(|c| !(c.tenant_id == tenant_id && c.id == id));
        Ok(registros.len() < antes)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ConvenioComEmpresa>, AppError> {
        let c = lock(&self.convenios)
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == id)
            .cloned();
        Ok(c.and_then(|c| self.convenio_com_empresa(c)))
    }

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<ConvenioComEmpresa>, AppError> {
        let c = lock(&self.convenios)
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.empresa_id == empresa_id)
            .cloned();
        Ok(c.and_then(|c| self.convenio_com_empresa(c)))
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<ConvenioComEmpresa>, AppError> {
        let registros: Vec<Convenio> = lock(&self.convenios)
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(registros.into_iter().filter_map(|c| self.convenio_com_empresa(c)).collect())
    }
}

// --- Formulários ---

#[async_trait]
impl FormularioRepository for MemoryStore {
    async fn insert(&self, formulario: &Formulario) -> Result<(), AppError> {
        let mut formularios = lock(&self.formularios);
        if formularios.iter().any(|f| {
            f.tenant_id == formulario.tenant_id && f.codigo_formulario == formulario.codigo_formulario
        }) {
            return Err(conflito(MSG_FORMULARIO_DUPLICADO));
        }
        formularios.push(formulario.clone());
        Ok(())
    }

    async fn update(&self, formulario: &Formulario) -> Result<(), AppError> {
        let mut formularios = lock(&self.formularios);
        if formularios.iter().any(|f| {
            f.id != formulario.id
                && f.tenant_id == formulario.tenant_id
                && f.codigo_formulario == formulario.codigo_formulario
        }) {
            return Err(conflito(MSG_FORMULARIO_DUPLICADO));
        }
        substituir(&mut formularios, formulario, |f| f.id);
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut formularios = lock(&self.formularios);
        let antes = formularios.len();
        formularios.retain(|f| !(f.tenant_id == tenant_id && f.id == id));
        Ok(formularios.len() < antes)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Formulario>, AppError> {
        Ok(lock(&self.formularios)
            .iter()
            .find(|f| f.tenant_id == tenant_id && f.id == id)
            .cloned())
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<Formulario>, AppError> {
        Ok(lock(&self.formularios)
            .iter()
            .find(|f| f.tenant_id == tenant_id && f.codigo_formulario == codigo)
            .cloned())
    }

    async fn list(&self, tenant_id: Uuid, filtro: &FiltroFormularios) -> Result<Vec<Formulario>, AppError> {
        let mut formularios: Vec<Formulario> = lock(&self.formularios)
            .iter()
            .filter(|f| f.tenant_id == tenant_id && filtro.aceita(f))
            .cloned()
            .collect();
        formularios.sort_by(|a, b| {
            a.nome_formulario.cmp(&b.nome_formulario).then(a.versao.cmp(&b.versao))
        });
        Ok(formularios)
    }
}

// --- Contas a pagar ---

#[async_trait]
impl ContaPagarRepository for MemoryStore {
    async fn insert(&self, nova: &NovaContaPagar) -> Result<(), AppError> {
        let mut contas = lock(&self.contas);
        if contas.iter().any(|c| {
            c.tenant_id == nova.conta.tenant_id && c.codigo_interno == nova.conta.codigo_interno
        }) {
            return Err(conflito("Já existe uma conta a pagar com este código interno"));
        }
        contas.push(nova.conta.clone());
        lock(&self.parcelas).extend(nova.parcelas.iter().cloned());
        lock(&self.impostos).extend(nova.impostos.iter().cloned());
        lock(&self.composicoes).extend(nova.composicoes.iter().cloned());
        Ok(())
    }

    async fn update(&self, conta: &ContaPagar) -> Result<(), AppError> {
        substituir(&mut lock(&self.contas), conta, |c| c.id);
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut contas = lock(&self.contas);
        let antes = contas.len();
        contas.retain(|c| !(c.tenant_id == tenant_id && c.id == id));
        if contas.len() == antes {
            return Ok(false);
        }

        let mut parcelas = lock(&self.parcelas);
        let parcelas_da_conta: Vec<Uuid> = parcelas
            .iter()
            .filter(|p| p.conta_pagar_id == id)
            .map(|p| p.id)
            .collect();
        parcelas.retain(|p| p.conta_pagar_id != id);
        lock(&self.pagamentos).retain(|p| !parcelas_da_conta.contains(&p.parcela_id));
        lock(&self.impostos).retain(|i| i.conta_pagar_id != id);
        lock(&self.composicoes).retain(|c| c.conta_pagar_id != id);
        lock(&self.anexos).retain(|a| a.conta_pagar_id != id);
        Ok(true)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ContaPagar>, AppError> {
        Ok(lock(&self.contas)
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.id == id)
            .cloned())
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<ContaPagar>, AppError> {
        Ok(lock(&self.contas)
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.codigo_interno == codigo)
            .cloned())
    }

    async fn find_detalhe(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ContaPagarDetalhe>, AppError> {
        let Some(conta) = ContaPagarRepository::find_by_id(self, tenant_id, id).await? else {
            return Ok(None);
        };
        let mut parcelas: Vec<Parcela> = lock(&self.parcelas)
            .iter()
            .filter(|p| p.conta_pagar_id == id)
            .cloned()
            .collect();
        parcelas.sort_by_key(|p| p.numero_parcela);

        Ok(Some(ContaPagarDetalhe {
            conta,
            parcelas,
            impostos_retidos: lock(&self.impostos)
                .iter()
                .filter(|i| i.conta_pagar_id == id)
                .cloned()
                .collect(),
            composicoes_financeiras: lock(&self.composicoes)
                .iter()
                .filter(|c| c.conta_pagar_id == id)
                .cloned()
                .collect(),
            anexos: lock(&self.anexos)
                .iter()
                .filter(|a| a.conta_pagar_id == id)
                .cloned()
                .collect(),
        }))
    }

    async fn maior_sequencia(&self, tenant_id: Uuid, prefixo: &str) -> Result<Option<i64>, AppError> {
        Ok(lock(&self.contas)
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .filter_map(|c| sequencia_do_codigo(prefixo, &c.codigo_interno))
            .max())
    }

    async fn list(&self, tenant_id: Uuid, filtro: &FiltroContas) -> Result<Vec<ContaPagar>, AppError> {
        let mut contas: Vec<ContaPagar> = lock(&self.contas)
            .iter()
            .filter(|c| c.tenant_id == tenant_id && filtro.aceita(c))
            .cloned()
            .collect();
        contas.sort_by(|a, b| b.data_emissao.cmp(&a.data_emissao));
        Ok(contas)
    }

    async fn find_parcela(&self, tenant_id: Uuid, parcela_id: Uuid) -> Result<Option<Parcela>, AppError> {
        let parcela = lock(&self.parcelas).iter().find(|p| p.id == parcela_id).cloned();
        let do_tenant = |p: &Parcela| {
            lock(&self.contas)
                .iter()
                .any(|c| c.id == p.conta_pagar_id && c.tenant_id == tenant_id)
        };
        Ok(parcela.filter(do_tenant))
    }

    async fn find_pagamento(&self, parcela_id: Uuid) -> Result<Option<PagamentoParcela>, AppError> {
        Ok(lock(&self.pagamentos)
            .iter()
            .find(|p| p.parcela_id == parcela_id)
            .cloned())
    }

    async fn registrar_pagamento(&self, parcela: &Parcela, pagamento: &PagamentoParcela) -> Result<(), AppError> {
        let mut pagamentos = lock(&self.pagamentos);
        if pagamentos.iter().any(|p| p.parcela_id == pagamento.parcela_id) {
            return Err(conflito("Esta parcela já possui pagamento registrado"));
        }
        pagamentos.push(pagamento.clone());
        substituir(&mut lock(&self.parcelas), parcela, |p| p.id);
        Ok(())
    }

    async fn insert_anexo(&self, anexo: &AnexoContaPagar) -> Result<(), AppError> {
        lock(&self.anexos).push(anexo.clone());
        Ok(())
    }

    async fn list_anexos(&self, conta_pagar_id: Uuid) -> Result<Vec<AnexoContaPagar>, AppError> {
        Ok(lock(&self.anexos)
            .iter()
            .filter(|a| a.conta_pagar_id == conta_pagar_id)
            .cloned()
            .collect())
    }
}
