//! Token and signal extraction shared by learning and suggestion.

use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Structural markers: (signal name, pattern). Matched on the raw text.
static FORMAT_MARKERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("has_date_format", r"\d{1,2}/\d{1,2}/\d{4}"),
        ("has_cpf_format", r"\d{3}\.\d{3}\.\d{3}-\d{2}"),
        ("has_rg_format", r"\d{1,2}\.\d{3}\.\d{3}-\d{1,2}"),
        ("has_cnpj_format", r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}"),
        ("has_money_format", r"R\$\s*\d+[,.]?\d*"),
        ("has_cep_format", r"\d{5}-?\d{3}"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// Category-specific keywords looked up in content.
const LEARNING_KEYWORDS: &[(&str, &[&str])] = &[
    ("rg", &["registro geral", "carteira de identidade", "rg nº", "identidade", "documento de identidade"]),
    ("cpf", &["cadastro de pessoa física", "cpf", "receita federal", "contribuinte"]),
    ("cnh", &["carteira nacional", "habilitação", "detran", "condutor", "permissão para dirigir"]),
    ("certidao_nascimento", &["certidão de nascimento", "nascimento", "cartório", "registro civil"]),
    ("certidao_casamento", &["certidão de casamento", "casamento", "matrimônio", "união"]),
    ("certidao_obito", &["certidão de óbito", "óbito", "falecimento", "morte"]),
    ("holerite", &["contracheque", "holerite", "salário", "remuneração", "folha de pagamento"]),
    ("conta_luz", &["conta de luz", "energia elétrica", "kwh", "cemig", "cpfl", "eletropaulo"]),
    ("conta_agua", &["conta de água", "saneamento", "sabesp", "copasa", "águas"]),
    ("conta_gas", &["conta de gás", "gás natural", "comgás"]),
    ("extrato_bancario", &["extrato", "banco", "saldo", "movimentação", "conta corrente"]),
    ("comprovante_residencia", &["comprovante de residência", "endereço", "residência"]),
    ("comprovante_renda", &["comprovante de renda", "declaração de renda", "rendimentos"]),
    ("diploma", &["diploma", "graduação", "conclusão de curso", "formatura"]),
    ("historico_escolar", &["histórico escolar", "boletim", "notas", "disciplinas"]),
    ("atestado_medico", &["atestado médico", "atestado", "médico", "cid"]),
    ("laudo_medico", &["laudo médico", "laudo", "exame", "diagnóstico"]),
    ("nota_fiscal", &["nota fiscal", "nf-e", "cupom fiscal", "danfe"]),
    ("recibo", &["recibo", "comprovante de pagamento", "quitação"]),
    ("procuracao", &["procuração", "mandato", "representação legal"]),
    ("contrato_aluguel", &["contrato de aluguel", "locação", "inquilino", "locador"]),
    ("carta", &["carta", "correspondência", "missiva", "letter", "comunicação"]),
    ("bulletin_salaire", &["bulletin de salaire", "bulletin de paie", "salaire brut", "net à payer", "cotisations"]),
];

/// Filename tokens: lowercase words longer than two characters, the
/// extension included, then a `num_<len>_digits` marker per run of three
/// or more digits. Repeats are kept; each one counts on its own.
pub fn filename_tokens(filename: &str) -> Vec<String> {
    let lower = filename.to_lowercase();

    let words = WORD
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string);
    let numbers = DIGITS
        .find_iter(filename)
        .map(|m| m.as_str().len())
        .filter(|len| *len >= 3)
        .map(|len| format!("num_{len}_digits"));

    words.chain(numbers).collect()
}

/// Content signals for one category: its keyword hits, then the
/// structural markers present in the text.
pub fn content_signals(text: &str, category: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();

    let keywords = LEARNING_KEYWORDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, kws)| *kws)
        .unwrap_or(&[])
        .iter()
        .filter(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string());
    let markers = FORMAT_MARKERS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| name.to_string());

    keywords.chain(markers).collect()
}
