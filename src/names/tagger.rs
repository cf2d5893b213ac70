//! Dictionary-and-shape name tagger for Latin-script names.

use std::collections::HashSet;

use super::NameTagger;

/// Given names common on score title pages.
const GIVEN_NAMES: &[&str] = &[
    "aaron", "alban", "alexander", "alexandre", "alessandro", "amadeus", "amy", "anna", "anton",
    "antonin", "antonín", "antonio", "arcangelo", "arnold", "arvo", "astor", "bedrich", "bedřich",
    "bela", "béla", "benjamin", "camille", "carl", "charles", "christian", "christoph", "clara",
    "claude", "darius", "david", "dmitri", "dmitry", "domenico", "edvard", "edward", "emma",
    "ennio", "erich", "erik", "ernest", "fanny", "felix", "ferruccio", "francis", "franz",
    "frederic", "frédéric", "friedrich", "fryderyk", "gabriel", "gaetano", "george", "georg",
    "giacomo", "gioachino", "giuseppe", "gustav", "hans", "hector", "heinrich", "heitor", "henri",
    "henry", "hugo", "igor", "ilyich", "isaac", "jacques", "james", "jan", "jean", "joe",
    "johann", "johannes", "john", "joseph", "jules", "karl", "leonard", "lili", "ludwig",
    "manuel", "maria", "mary", "maurice", "max", "michael", "mily", "modest", "muzio", "nadia",
    "niccolo", "niccolò", "nikolai", "olivier", "ottorino", "paul", "percy", "peter", "philip",
    "philippe", "pyotr", "ralph", "reinhold", "richard", "robert", "ryuichi", "samuel", "scott",
    "sebastian", "sergei", "sergey", "thomas", "vincenzo", "wilhelm", "william", "wolfgang",
];

/// Surnames common on score title pages, including romanized Korean family names.
const SURNAMES: &[&str] = &[
    "albeniz", "albéniz", "bach", "barber", "bartok", "bartók", "beethoven", "bernstein", "bizet",
    "boccherini", "borodin", "brahms", "britten", "bruckner", "burgmuller", "burgmüller",
    "chopin", "clementi", "copland", "corelli", "couperin", "czerny", "debussy", "dvorak",
    "dvořák", "einaudi", "elgar", "faure", "fauré", "franck", "gershwin", "glass", "glinka",
    "gluck", "gounod", "granados", "grieg", "handel", "händel", "haydn", "hisaishi", "holst",
    "hummel", "joplin", "kreisler", "kuhlau", "lehar", "lehár", "liszt", "lully", "mahler",
    "massenet", "mendelssohn", "milhaud", "monteverdi", "mozart", "mussorgsky", "offenbach",
    "pachelbel", "paganini", "piazzolla", "poulenc", "prokofiev", "puccini", "purcell",
    "rachmaninoff", "rachmaninov", "rameau", "ravel", "reich", "rossini", "saens",
    "saëns", "sakamoto", "sarasate", "satie", "scarlatti", "schubert", "schumann", "scriabin",
    "shostakovich", "sibelius", "strauss", "stravinsky", "tchaikovsky", "telemann", "verdi",
    "vivaldi", "wagner", "weber", "wieniawski",
    "ahn", "cho", "choi", "han", "hong", "hwang", "jang", "jung", "kang", "kim", "kwon", "lee",
    "lim", "oh", "park", "seo", "shin", "song", "yoo", "yoon",
];

/// Lowercase particles that may sit inside a name.
const PARTICLES: &[&str] = &[
    "van", "von", "de", "da", "di", "del", "della", "der", "den", "du", "des", "la", "le", "y",
    "zu", "ten", "ter", "af", "v.",
];

/// Capitalized words that are never part of a name on a score.
const MUSICAL_VOCABULARY: &[&str] = &[
    // forms and titles
    "adagio", "air", "album", "ballade", "barcarolle", "berceuse", "bourree", "bourrée",
    "canon", "caprice", "concerto", "dance", "duet", "elegy", "etude", "étude", "fantasia",
    "fantasie", "fugue", "gavotte", "gigue", "gymnopedie", "gymnopédie", "hymn", "impromptu",
    "intermezzo", "invention", "lullaby", "march", "mazurka", "menuet", "minuet", "movement",
    "nocturne", "overture", "partita", "polonaise", "prelude", "prélude", "requiem", "rhapsody",
    "romance", "rondo", "sarabande", "scherzo", "serenade", "sonata", "sonatina", "song",
    "suite", "symphony", "theme", "toccata", "trio", "valse", "variations", "waltz",
    // tempo and expression
    "allegretto", "allegro", "andante", "andantino", "cantabile", "con", "dolce", "espressivo",
    "grave", "largo", "larghetto", "lento", "maestoso", "moderato", "molto", "moto", "poco",
    "presto", "tempo", "vivace", "vivo",
    // instruments
    "bass", "bassoon", "cello", "clarinet", "contrabass", "flute", "guitar", "harp",
    "harpsichord", "horn", "oboe", "orchestra", "organ", "percussion", "piano", "piccolo",
    "saxophone", "soprano", "alto", "tenor", "baritone", "strings", "timpani", "trombone",
    "trumpet", "tuba", "viola", "violin", "violoncello", "voice", "choir",
    // catalogue and score furniture
    "arr", "arranged", "bwv", "by", "composed", "composer", "edition", "for", "hob", "k", "kv",
    "major", "minor", "mvt", "no", "nr", "op", "opus", "part", "score", "the", "and", "of",
    "in", "from", "with", "music", "words", "lyrics", "für", "fur", "pour", "à",
];

/// Classification of one whitespace-separated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    /// Capitalized (or all-caps) word that is not musical vocabulary
    Word,
    /// "J." or "J.S."
    Initial,
    /// Lowercase particle such as "van"
    Particle,
    /// Anything that ends a name
    Break,
}

/// Default [`NameTagger`].
///
/// Flags runs of capitalized words and initials as names when they contain a
/// known given name or surname, pair an initial with a word, or join words
/// with a particle ("Ludwig van Beethoven", "C. Debussy", "Kim Min-jun").
/// Musical vocabulary breaks a run, so "Moonlight Sonata" is not a name.
#[derive(Debug, Clone)]
pub struct LexicalNameTagger {
    known_names: HashSet<String>,
    particles: HashSet<String>,
    vocabulary: HashSet<String>,
}

impl Default for LexicalNameTagger {
    fn default() -> Self {
        let set = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<HashSet<_>>();
        let mut known_names = set(GIVEN_NAMES);
        known_names.extend(set(SURNAMES));

        Self {
            known_names,
            particles: set(PARTICLES),
            vocabulary: set(MUSICAL_VOCABULARY),
        }
    }
}

impl LexicalNameTagger {
    /// Create a tagger with the built-in word lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add known given names or surnames.
    pub fn with_known_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_names
            .extend(names.into_iter().map(|n| n.as_ref().to_lowercase()));
        self
    }

    /// Add words that must never be read as part of a name.
    pub fn with_vocabulary<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.vocabulary
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    fn classify(&self, token: &str) -> TokenKind {
        let lower = token.to_lowercase();
        let is_lower = token.chars().all(|c| !c.is_uppercase());
        let is_upper = token.chars().all(|c| !c.is_lowercase());

        if (is_lower || is_upper) && self.particles.contains(&lower) && token.len() > 1 {
            return TokenKind::Particle;
        }
        if is_initial(token) {
            return TokenKind::Initial;
        }

        let word = lower.trim_end_matches('.');
        if word.is_empty() || self.vocabulary.contains(word) {
            return TokenKind::Break;
        }

        let mut chars = token.trim_end_matches('.').chars();
        let Some(first) = chars.next() else {
            return TokenKind::Break;
        };
        let rest: Vec<char> = chars.collect();
        let shaped = first.is_uppercase()
            && !rest.is_empty()
            && rest
                .iter()
                .all(|c| c.is_alphabetic() || *c == '-' || *c == '\'' || *c == '’');

        if shaped {
            TokenKind::Word
        } else {
            TokenKind::Break
        }
    }

    fn is_known(&self, token: &str) -> bool {
        let lower = token.trim_end_matches('.').to_lowercase();
        self.known_names.contains(&lower)
            || lower
                .split(['-', '\''])
                .any(|part| self.known_names.contains(part))
    }

    fn accept_run(&self, run: &[(&str, TokenKind)]) -> bool {
        let words = run.iter().filter(|(_, k)| *k == TokenKind::Word).count();
        let initials = run.iter().filter(|(_, k)| *k == TokenKind::Initial).count();
        let particles = run.iter().filter(|(_, k)| *k == TokenKind::Particle).count();

        if words == 0 {
            return false;
        }
        if run
            .iter()
            .any(|(t, k)| *k == TokenKind::Word && self.is_known(t))
        {
            return true;
        }
        if initials > 0 {
            return true;
        }
        particles > 0 && words >= 2
    }
}

impl NameTagger for LexicalNameTagger {
    fn personal_names(&self, text: &str) -> Vec<String> {
        let tokens: Vec<(&str, TokenKind)> = text
            .split_whitespace()
            .map(trim_token)
            .filter(|t| !t.is_empty())
            .map(|t| (t, self.classify(t)))
            .collect();

        let mut names = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            if tokens[start].1 == TokenKind::Break {
                start += 1;
                continue;
            }
            let mut end = start;
            while end < tokens.len() && tokens[end].1 != TokenKind::Break {
                end += 1;
            }

            let mut run = &tokens[start..end];
            while run.first().is_some_and(|(_, k)| *k == TokenKind::Particle) {
                run = &run[1..];
            }
            while run.last().is_some_and(|(_, k)| *k == TokenKind::Particle) {
                run = &run[..run.len() - 1];
            }

            if self.accept_run(run) {
                let name: Vec<&str> = run.iter().map(|(t, _)| *t).collect();
                names.push(name.join(" "));
            }
            start = end;
        }

        names
    }
}

/// Strip surrounding punctuation, keeping a trailing period for initials.
fn trim_token(token: &str) -> &str {
    token
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(|c: char| !c.is_alphanumeric() && c != '.')
}

fn is_initial(token: &str) -> bool {
    let mut chars = token.chars().peekable();
    let mut count = 0;
    while let Some(c) = chars.next() {
        if !c.is_uppercase() || chars.next() != Some('.') {
            return false;
        }
        count += 1;
    }
    count > 0
}
