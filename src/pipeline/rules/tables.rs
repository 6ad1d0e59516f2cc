//! Static keyword tables. Declaration order is match order.

use super::{ContentRule, FilenameRule};
use crate::pipeline::categories::{FALLBACK_CATEGORY, INVOICE_CATEGORY};

const fn filename(category: &'static str, keywords: &'static [&'static str]) -> FilenameRule {
    FilenameRule { category, keywords }
}

const fn content(category: &'static str, keywords: &'static [&'static str]) -> ContentRule {
    ContentRule {
        category,
        keywords,
        min_hits: 1,
        vetoes: &[],
    }
}

/// Tokens that send a fallback filename match to the invoice category.
pub const INVOICE_FILENAME_TOKENS: &[&str] = &["nota", "fiscal", "nf", "nfe"];

// ═══════════════════════════════════════════════════════════
// Filename tier
// ═══════════════════════════════════════════════════════════

pub static FILENAME_RULES: &[FilenameRule] = &[
    // Identity
    filename("rg", &["rg", "identidade", "carteira_identidade", "cedula"]),
    filename("cpf", &["cpf", "cadastro_pessoa_fisica"]),
    filename("cnh", &["cnh", "carteira_habilitacao", "habilitacao"]),
    filename("passaporte", &["passaporte", "passport"]),
    // Civil registry
    filename("certidao_nascimento", &["certidao", "nascimento", "birth"]),
    filename("certidao_casamento", &["certidao", "casamento", "marriage"]),
    filename("certidao_obito", &["certidao", "obito", "death"]),
    filename("certidao_antecedentes", &["certidao", "antecedentes", "criminal"]),
    // Work and income
    filename("holerite", &["holerite", "folha", "pagamento", "salario"]),
    filename("certificado_trabalho", &["certificado", "trabalho", "emprego"]),
    filename("comprovante_renda", &["comprovante", "renda", "rendimento"]),
    filename("declaracao_imposto", &["declaracao", "imposto", "renda", "receita"]),
    // Education
    filename("diploma", &["diploma", "graduacao", "formatura"]),
    filename("certificado_escolar", &["certificado", "escolar", "curso"]),
    filename("historico_escolar", &["historico", "escolar", "notas"]),
    filename("comprovante_matricula", &["comprovante", "matricula", "escola"]),
    // Medical
    filename("atestado_medico", &["atestado", "medico", "saude"]),
    filename("laudo_medico", &["laudo", "medico", "exame"]),
    filename("comprovante_vacinacao", &["comprovante", "vacinacao", "vacina"]),
    filename("cartao_vacinacao", &["cartao", "vacinacao", "vacina"]),
    // Banking
    filename("comprovante_bancario", &["comprovante", "bancario", "banco"]),
    filename("extrato_bancario", &["extrato", "bancario", "conta"]),
    // no "doc": generic scan names must reach the content tiers
    filename("comprovante_transferencia", &["comprovante", "transferencia", "ted"]),
    filename("comprovante_deposito", &["comprovante", "deposito"]),
    // Residence and utility bills
    filename("comprovante_residencia", &["comprovante", "residencia", "endereco"]),
    filename("conta_luz", &["conta", "luz", "energia", "eletrica", "cemig", "copel", "celpe"]),
    filename("conta_agua", &["conta", "agua", "saneamento", "sabesp", "cedae"]),
    filename("conta_gas", &["conta", "gas", "comgas", "naturgy"]),
    filename(
        "conta_telefone",
        &[
            "conta", "telefone", "celular", "tim", "vivo", "claro", "oi", "nextel", "algar", "telefonica", "fatura",
            "mobile", "fixo", "linha",
        ],
    ),
    // Payments
    filename("comprovante_pagamento", &["comprovante", "pagamento"]),
    filename("recibo", &["recibo", "pagamento"]),
    filename(INVOICE_CATEGORY, &["nota", "fiscal", "nf", "nfe"]),
    filename("boleto", &["boleto", "cobranca"]),
    filename("comprovante_quitacao", &["comprovante", "quitacao"]),
    // Legal (Brazil)
    filename("autorizacao", &["autorizacao", "permissao"]),
    filename("procuracao", &["procuracao", "mandato", "representacao"]),
    filename("declaracao", &["declaracao"]),
    filename("licenca", &["licenca", "alvara"]),
    filename("alvara", &["alvara", "funcionamento"]),
    filename("permissao", &["permissao"]),
    // Courts (Brazil)
    filename("contrato", &["contrato", "acordo", "contract", "termo"]),
    filename("peticao", &["peticao", "inicial", "recurso", "defesa"]),
    filename("sentenca", &["sentenca", "decisao", "julgamento", "acordao"]),
    // Misc
    filename("atestado", &["atestado"]),
    filename("certificado", &["certificado"]),
    filename("credencial", &["credencial"]),
    filename("carteirinha", &["carteirinha"]),
    filename("cartao", &["cartao"]),
    filename("comprovante_isencao", &["comprovante", "isencao"]),
    // French immigration
    filename("titre_sejour", &["titre", "sejour", "residence"]),
    filename("visa_frances", &["visa", "visto", "schengen"]),
    filename("carte_resident", &["carte", "resident", "permanente"]),
    filename("attestation_hebergement", &["attestation", "hebergement", "logement"]),
    filename("justificatif_domicile", &["justificatif", "domicile", "residence"]),
    filename(
        "bulletin_salaire",
        &["bulletin-de-salaire", "bulletin_salaire", "bulletin", "salaire", "paie", "fiche-de-paie"],
    ),
    filename("contrat_travail", &["contrat", "travail", "emploi"]),
    filename("attestation_employeur", &["attestation", "employeur", "travail"]),
    filename("avis_imposition", &["avis", "imposition", "impot"]),
    filename("certificat_scolarite", &["certificat", "scolarite", "etudiant"]),
    filename("diplome_francais", &["diplome", "universite", "formation"]),
    filename("acte_naissance_traduit", &["acte", "naissance", "traduit"]),
    filename("casier_judiciaire", &["casier", "judiciaire", "penal"]),
    filename("certificat_medical", &["certificat", "medical", "sante"]),
    filename("assurance_maladie", &["assurance", "maladie", "securite", "sociale"]),
    filename("liste_documents", &["lista", "documentos", "regularizacao", "regularisation"]),
    // French legal procedure
    filename("tableau_vie_commune", &["tableau", "vie", "commune", "justificatifs", "conjoint"]),
    filename("refere_suspension", &["refere", "suspension", "tribunal", "administratif"]),
    filename("accuse_depot", &["accuse", "depot", "recommande", "envoi"]),
    filename("accuse_reception", &["accuse", "reception", "requete", "depot"]),
    filename("requete_tribunal", &["requete", "tribunal", "administratif", "petition"]),
    filename("lettre_recommandee", &["lettre", "recommandee", "poste", "envoi"]),
    filename("document_tribunal", &["tribunal", "administratif", "juridique", "judiciaire"]),
    filename("procedure_administrative", &["procedure", "administrative", "demarche"]),
    filename("recours_administratif", &["recours", "administratif", "contestation"]),
    // French attestations
    filename(
        "attestation_honneur",
        &["attestation", "honneur", "lhonneur", "sur_lhonneur", "epoux", "requerante"],
    ),
    filename("attestation_depot", &["attestation", "depot", "de_depot"]),
    filename("passeport", &["passeport", "passport"]),
    // no keywords of its own; custom tables may add some
    filename(FALLBACK_CATEGORY, &[]),
];

// ═══════════════════════════════════════════════════════════
// Content tiers
// ═══════════════════════════════════════════════════════════

pub static LEGAL_RULES: &[ContentRule] = &[
    content(
        "tableau_vie_commune",
        &[
            "tableau détaillé des justificatifs",
            "justificatifs de vie commune",
            "vie commune",
            "conjoint",
            "concubinage",
            "pacs",
            "mariage",
            "madame",
            "monsieur",
            "et son conjoint",
            "et sa conjointe",
        ],
    ),
    content(
        "refere_suspension",
        &[
            "référé suspension",
            "tribunal administratif",
            "requête en référé",
            "suspension de l'exécution",
            "mesures d'urgence",
            "référé-suspension",
            "tribunal administratif de",
            "demande de suspension",
        ],
    ),
    content(
        "accuse_depot",
        &[
            "accusé de dépôt",
            "envoi recommandé",
            "lettre recommandée",
            "la poste",
            "dépôt d'un envoi",
            "recommandé avec accusé",
            "numéro de suivi",
            "preuve de dépôt",
        ],
    ),
    content(
        "accuse_reception",
        &[
            "accusé de réception",
            "réception d'un dépôt",
            "dépôt de requête",
            "comprovante de recebimento",
            "requerimento apresentado",
            "réception de la demande",
            "enregistrement de la requête",
        ],
    ),
    content(
        "requete_tribunal",
        &[
            "requête",
            "tribunal administratif",
            "demande au tribunal",
            "pétition",
            "recours contentieux",
            "contentieux administratif",
            "juridiction administrative",
            "instance administrative",
        ],
    ),
    content(
        "lettre_recommandee",
        &[
            "lettre recommandée",
            "envoi recommandé",
            "courrier recommandé",
            "accusé de réception postal",
            "la poste française",
            "service postal",
            "recommandé ar",
        ],
    ),
    content(
        "document_tribunal",
        &[
            "tribunal",
            "juridiction",
            "cour administrative",
            "instance judiciaire",
            "procédure judiciaire",
            "acte judiciaire",
            "décision de justice",
        ],
    ),
    content(
        "procedure_administrative",
        &[
            "procédure administrative",
            "démarche administrative",
            "formalité administrative",
            "administration française",
            "service public",
            "démarche officielle",
        ],
    ),
    content(
        "recours_administratif",
        &[
            "recours administratif",
            "contestation administrative",
            "recours gracieux",
            "recours hiérarchique",
            "opposition administrative",
            "révision administrative",
        ],
    ),
];

pub static SPECIFIC_RULES: &[ContentRule] = &[
    content(
        "attestation_honneur",
        &[
            "attestation sur l'honneur",
            "attestation d'honneur",
            "sur l'honneur",
            "je soussigné",
            "atteste sur l'honneur",
            "certifie sur l'honneur",
            "déclare sur l'honneur",
            "époux",
            "épouse",
            "requérante",
        ],
    ),
    content(
        "attestation_depot",
        &[
            "attestation de dépôt",
            "attestation dépôt",
            "dépôt de dossier",
            "accusé de dépôt",
            "confirmation de dépôt",
            "récépissé de dépôt",
        ],
    ),
    content(
        "bulletin_salaire",
        &[
            "bulletin de salaire",
            "bulletin de paie",
            "fiche de paie",
            "salaire brut",
            "salaire net",
            "cotisations sociales",
            "employeur",
            "salarié",
            "période de paie",
            "rémunération",
        ],
    ),
    content(
        "passeport",
        &[
            "passeport",
            "passport",
            "république française",
            "ministère des affaires étrangères",
            "document de voyage",
            "identité française",
            "nationalité française",
            "passeport français",
            "passeport biométrique",
        ],
    ),
];

/// Terms whose presence suppresses a content match on identity documents.
pub const IDENTITY_VETO_TERMS: &[&str] = &[
    "tribunal",
    "attestation",
    "accusé",
    "requête",
    "dépôt",
    "passeport",
    "bulletin",
    "salaire",
];

/// Hits required before an identity document matches on content.
pub const IDENTITY_MIN_HITS: usize = 3;

pub static GENERAL_RULES: &[ContentRule] = &[
    ContentRule {
        category: "rg",
        keywords: &[
            "registro geral",
            "carteira de identidade",
            "secretaria de segurança pública",
            "instituto de identificação",
            "rg nº",
            "carteira identidade",
            "documento de identidade",
        ],
        min_hits: IDENTITY_MIN_HITS,
        vetoes: IDENTITY_VETO_TERMS,
    },
    content(
        "cpf",
        &["cadastro de pessoa física", "receita federal do brasil", "cpf nº", "situação cadastral"],
    ),
    content(
        "cnh",
        &[
            "carteira nacional de habilitação",
            "detran",
            "categoria a",
            "categoria b",
            "categoria c",
            "categoria d",
            "categoria e",
        ],
    ),
    content(
        "passaporte",
        &["passaporte brasileiro", "passport", "ministério das relações exteriores", "polícia federal"],
    ),
    content(
        "certidao_nascimento",
        &["certidão de nascimento", "registro civil das pessoas naturais", "nasceu no dia", "filho de"],
    ),
    content(
        "certidao_casamento",
        &["certidão de casamento", "registro civil das pessoas naturais", "casaram-se", "contraíram matrimônio"],
    ),
    content(
        "certidao_obito",
        &["certidão de óbito", "registro civil das pessoas naturais", "faleceu", "causa da morte"],
    ),
    content(
        "holerite",
        &[
            "demonstrativo de pagamento",
            "folha de pagamento",
            "salário base",
            "desconto inss",
            "salário líquido",
        ],
    ),
    content(
        "comprovante_bancario",
        &["comprovante de operação bancária", "agência", "conta corrente", "saldo disponível"],
    ),
    content(
        "extrato_bancario",
        &["extrato de conta corrente", "movimentação bancária", "saldo anterior", "saldo atual"],
    ),
    content(
        "conta_telefone",
        &[
            "fatura de telefone",
            "conta de telefone",
            "fatura celular",
            "conta celular",
            "tim",
            "vivo",
            "claro",
            "oi",
            "nextel",
            "algar",
            "telefônica",
            "linha telefônica",
            "plano pós-pago",
            "plano pré-pago",
            "serviços de telecomunicações",
            "valor da fatura",
            "vencimento da fatura",
            "número da linha",
            "consumo de dados",
            "chamadas realizadas",
            "sms enviados",
            "internet móvel",
            "roaming",
            "anatel",
            "agência nacional de telecomunicações",
            "código de área",
            "fatura detalhada",
            "resumo da conta",
            "débito automático",
        ],
    ),
    content(
        INVOICE_CATEGORY,
        &["nota fiscal eletrônica", "cnpj", "valor total da nota", "icms", "danfe"],
    ),
    content(
        "atestado",
        &["atestado médico", "cid-10", "afastamento por", "dias de repouso"],
    ),
    content(
        "certificado",
        &["certificado de conclusão", "carga horária", "aprovado com", "instituição de ensino"],
    ),
    content(
        "diploma",
        &["diploma de graduação", "universidade", "bacharel em", "licenciado em", "tecnólogo em"],
    ),
    content(
        "carta",
        &["prezado senhor", "prezada senhora", "atenciosamente", "cordialmente", "respeitosamente"],
    ),
    content(
        "titre_sejour",
        &[
            "titre de séjour",
            "carte de séjour",
            "préfecture",
            "ofii",
            "autorisation de séjour",
            "récépissé de demande",
            "renouvellement",
        ],
    ),
    content(
        "visa_frances",
        &[
            "visa",
            "consulat de france",
            "schengen",
            "entrée en france",
            "ambassade de france",
            "visa de long séjour",
            "vls-ts",
        ],
    ),
    content(
        "carte_resident",
        &[
            "carte de résident",
            "résident permanent",
            "carte de résident permanent",
            "titre de séjour de 10 ans",
            "résident de longue durée",
        ],
    ),
    content(
        "attestation_hebergement",
        &[
            "attestation d'hébergement",
            "héberge",
            "domicile chez",
            "certifie héberger",
            "logement gratuit",
            "hébergement à titre gratuit",
        ],
    ),
    content(
        "justificatif_domicile",
        &[
            "justificatif de domicile",
            "facture edf",
            "facture gdf",
            "facture eau",
            "quittance de loyer",
            "taxe d'habitation",
            "facture téléphone",
        ],
    ),
    content(
        "contrat_travail",
        &[
            "contrat de travail",
            "cdi",
            "cdd",
            "contrat à durée indéterminée",
            "contrat à durée déterminée",
            "employeur",
            "salarié",
        ],
    ),
    content(
        "attestation_employeur",
        &[
            "attestation employeur",
            "certificat de travail",
            "attestation de salaire",
            "emploi depuis",
            "fonction occupée",
            "rémunération mensuelle",
        ],
    ),
    content(
        "avis_imposition",
        &[
            "avis d'imposition",
            "impôt sur le revenu",
            "revenu fiscal de référence",
            "direction générale des finances publiques",
            "dgfip",
            "revenus déclarés",
        ],
    ),
    content(
        "certificat_scolarite",
        &[
            "certificat de scolarité",
            "attestation de scolarité",
            "étudiant inscrit",
            "année scolaire",
            "établissement scolaire",
            "université",
        ],
    ),
    content(
        "diplome_francais",
        &[
            "diplôme",
            "université",
            "licence",
            "master",
            "doctorat",
            "baccalauréat",
            "bts",
            "dut",
            "académie",
            "ministère de l'éducation",
        ],
    ),
    content(
        "acte_naissance_traduit",
        &[
            "acte de naissance",
            "traduction certifiée",
            "traducteur assermenté",
            "né le",
            "lieu de naissance",
            "état civil",
            "extrait de naissance",
        ],
    ),
    content(
        "casier_judiciaire",
        &[
            "casier judiciaire",
            "bulletin n°3",
            "extrait de casier judiciaire",
            "ministère de la justice",
            "condamnations",
            "vierge",
        ],
    ),
    content(
        "certificat_medical",
        &[
            "certificat médical",
            "médecin",
            "examen médical",
            "aptitude physique",
            "visite médicale",
            "ofii médical",
            "tuberculose",
        ],
    ),
    content(
        "assurance_maladie",
        &[
            "assurance maladie",
            "sécurité sociale",
            "carte vitale",
            "cpam",
            "attestation de droits",
            "numéro de sécurité sociale",
            "mutuelle",
        ],
    ),
    content(
        "liste_documents",
        &[
            "lista de documentos",
            "liste des documents",
            "regularização",
            "regularisation",
            "dossier de demande",
            "pièces à fournir",
            "documents requis",
            "checklist",
        ],
    ),
];
