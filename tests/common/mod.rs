use std::{collections::HashMap, fs, path::Path};

/// Write `lines` to `dir/name`, one per line.
pub fn write_file<S: AsRef<str>>(dir: &Path, name: &str, lines: &[S]) {
    let mut content = String::new();
    for line in lines {
        content.push_str(line.as_ref());
        content.push('\n');
    }
    fs::write(dir.join(name), content).unwrap();
}

/// Parse a corpus file as an identifier -> value map.
pub fn read_map(path: &Path) -> HashMap<String, String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let id = tokens.next()?;
            Some((id.to_string(), tokens.collect::<Vec<_>>().join(" ")))
        })
        .collect()
}

/// A corpus of `nb_utts` whole-recording utterances said by `nb_spks` speakers,
/// with one transcript out of three repeated.
pub fn make_corpus(dir: &Path, nb_utts: usize, nb_spks: usize) {
    fs::create_dir_all(dir).unwrap();
    let utt = |i: usize| format!("utt{:03}", i);

    let text: Vec<String> = (0..nb_utts)
        .map(|i| {
            if i % 3 == 0 {
                format!("{} the same sentence", utt(i))
            } else {
                format!("{} sentence number {}", utt(i), i)
            }
        })
        .collect();
    let wav: Vec<String> = (0..nb_utts)
        .map(|i| format!("{} /corpus/wav/{}.wav", utt(i), utt(i)))
        .collect();
    let utt2spk: Vec<String> = (0..nb_utts)
        .map(|i| format!("{} spk{:02}", utt(i), i % nb_spks))
        .collect();

    write_file(dir, "text", &text);
    write_file(dir, "wav.scp", &wav);
    write_file(dir, "utt2spk", &utt2spk);
}
