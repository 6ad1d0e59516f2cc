//! Category catalog: ordered category id → display name table.
//!
//! Ids are the stable keys used by the rule tables, the learned pattern
//! store and the remote classifier. Display names are what a caller shows
//! next to a verdict.

use serde::{Deserialize, Serialize};

/// Reserved "no specific match" category. Its confidence is never numeric.
pub const FALLBACK_CATEGORY: &str = "outros";
pub const FALLBACK_DISPLAY_NAME: &str = "Outros Documentos";

/// Dedicated invoice category used by the filename tier redirect.
pub const INVOICE_CATEGORY: &str = "nota_fiscal";

/// Category returned by the people-photo pre-filter.
pub const PEOPLE_PHOTO_CATEGORY: &str = "foto_pessoas";

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("holerite", "Holerites"),
    ("certidao_nascimento", "Certidões de Nascimento"),
    ("certidao_casamento", "Certidões de Casamento"),
    ("certidao_obito", "Certidões de Óbito"),
    ("comprovante_residencia", "Comprovantes de Residência"),
    ("rg", "Identidade"),
    ("cpf", "CPF"),
    ("cnh", "CNH"),
    ("ctps", "CTPS"),
    ("passaporte", "Passaportes"),
    ("contrato", "Contratos"),
    ("procuracao", "Procurações"),
    ("peticao", "Petições"),
    ("sentenca", "Sentenças"),
    ("conta_luz", "Contas de Luz"),
    ("conta_agua", "Contas de Água"),
    ("conta_gas", "Contas de Gás"),
    ("conta_telefone", "Conta de Telefone"),
    ("extrato_bancario", "Extratos Bancários"),
    ("comprovante_bancario", "Comprovantes Bancários"),
    (INVOICE_CATEGORY, "Notas Fiscais e Documentos Comerciais"),
    ("recibo", "Recibos"),
    ("boleto", "Boletos"),
    ("diploma", "Diplomas"),
    ("atestado", "Atestados"),
    ("certificado", "Certificados"),
    ("carta", "Cartas"),
    ("titre_sejour", "Título de Permanência"),
    ("visa_frances", "Visto Francês"),
    ("carte_resident", "Cartão de Residente"),
    ("attestation_hebergement", "Atestado de Hospedagem"),
    ("justificatif_domicile", "Comprovante de Domicílio"),
    ("bulletin_salaire", "Holerite Francês"),
    ("contrat_travail", "Contrato de Trabalho"),
    ("attestation_employeur", "Atestado do Empregador"),
    ("avis_imposition", "Aviso de Impostos"),
    ("certificat_scolarite", "Certificado Escolar"),
    ("diplome_francais", "Diploma Francês"),
    ("acte_naissance_traduit", "Certidão de Nascimento Traduzida"),
    ("casier_judiciaire", "Antecedentes Criminais"),
    ("certificat_medical", "Certificado Médico"),
    ("assurance_maladie", "Seguro Saúde"),
    ("liste_documents", "Lista de Documentos"),
    ("tableau_vie_commune", "Quadro de Vida em Comum"),
    ("refere_suspension", "Referência de Suspensão"),
    ("accuse_depot", "Comprovante de Depósito"),
    ("accuse_reception", "Comprovante de Recebimento"),
    ("requete_tribunal", "Petição ao Tribunal"),
    ("lettre_recommandee", "Carta Registrada"),
    ("document_tribunal", "Documento do Tribunal"),
    ("procedure_administrative", "Procedimento Administrativo"),
    ("recours_administratif", "Recurso Administrativo"),
    ("attestation_honneur", "Declaração de Honra"),
    ("attestation_depot", "Atestado de Depósito"),
    ("passeport", "Passaporte"),
    (PEOPLE_PHOTO_CATEGORY, "Fotos de Pessoas"),
    (FALLBACK_CATEGORY, FALLBACK_DISPLAY_NAME),
];

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    pub display_name: String,
}

/// Ordered, immutable category catalog. Always contains the fallback category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    entries: Vec<CategoryEntry>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_CATEGORIES.iter().map(|(id, name)| (*id, *name)))
    }
}

impl CategoryCatalog {
    /// Build a catalog from (id, display name) pairs in the given order.
    /// Duplicate ids keep their first position and last display name; the
    /// fallback category is appended when absent.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut entries: Vec<CategoryEntry> = Vec::new();
        for (id, name) in pairs {
            let id = id.trim().to_lowercase();
            if id.is_empty() {
                continue;
            }
            match entries.iter_mut().find(|e| e.id == id) {
                Some(existing) => existing.display_name = name.to_string(),
                None => entries.push(CategoryEntry {
                    id,
                    display_name: name.to_string(),
                }),
            }
        }
        if !entries.iter().any(|e| e.id == FALLBACK_CATEGORY) {
            entries.push(CategoryEntry {
                id: FALLBACK_CATEGORY.to_string(),
                display_name: FALLBACK_DISPLAY_NAME.to_string(),
            });
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Display name for a category id. Unknown ids are title-cased.
    pub fn display_name(&self, id: &str) -> String {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| title_case(id))
    }
}

pub fn is_fallback(category: &str) -> bool {
    category == FALLBACK_CATEGORY
}

/// "conta_luz" → "Conta_Luz", matching how unnamed categories are shown.
fn title_case(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut upper_next = true;
    for ch in id.chars() {
        if ch.is_alphanumeric() {
            if upper_next {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            upper_next = false;
        } else {
            out.push(ch);
            upper_next = true;
        }
    }
    out
}
