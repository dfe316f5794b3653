//! Built-in word lists
//!
//! Foreign entries are English and Italian function words and common
//! vocabulary that never occur as Croatian words. Proper nouns are left out:
//! local news mentions foreign names all the time.

pub const FOREIGN_WORDS: &[&str] = &[
    // English
    "the", "that", "this", "these", "those", "there", "they", "them", "their", "because",
    "when", "what", "where", "which", "who", "whom", "whose", "why", "how", "would", "could",
    "should", "must", "might", "had", "been", "have", "has", "declared", "undesirable", "came",
    "forgot", "woman", "women", "just", "didn", "wasn", "doesn", "aren", "looking", "asked",
    "rolled", "over", "know", "knows", "knew", "known", "about", "above", "across", "after",
    "against", "along", "around", "before", "behind", "below", "beneath", "beside", "between",
    "beyond", "during", "except", "inside", "outside", "through", "under", "underneath", "fears",
    "will", "elections", "desperate", "men", "bans", "entry", "considering", "same", "with",
    "from", "were", "was", "and", "are", "is", "of", "for", "it", "not",
    // Italian
    "nella", "dello", "della", "degli", "delle", "nell", "italiano", "civiltà", "specchio",
    "allo", "epicentro", "declino", "femminicidio", "questa", "questo", "questi", "queste",
    "sono", "dove", "oggi", "paese", "essere", "alla", "legge", "più", "società", "cultura",
    "donne", "uomini", "volta", "ancora", "sempre", "anche", "quando", "perché", "senza",
    "tutto", "tutti", "ogni", "altro", "altra", "altri", "altre", "quello", "quella", "quelli",
    "quelle", "il", "gli", "che", "per", "di", "del",
];

pub const LOCAL_WORDS: &[&str] = &[
    "i", "u", "je", "na", "se", "da", "za", "su", "od", "sa", "ali", "ili", "koji", "koja",
    "koje", "kojeg", "kojem", "kao", "po", "iz", "do", "ne", "bio", "bila", "bilo", "biti",
    "smo", "ste", "sam", "ga", "ih", "mu", "joj", "nije", "samo", "te", "pa", "kad", "kada",
    "zbog", "prema", "nakon", "prije", "oko", "kod", "bez", "ovo", "ova", "ovaj", "taj", "tako",
    "sve", "svi", "bi", "li", "jer", "ako", "može", "mogu", "godine", "rekao", "rekla", "danas",
    "kako", "također", "vrlo", "njihov", "njegov", "njezin", "koliko", "gdje", "zato", "dok",
    "još", "već", "što", "će", "između", "tijekom",
];
