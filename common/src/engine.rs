use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Par clave/valor que emite map y consume reduce. Los nombres de campo van
/// capitalizados en los archivos intermedios; los lectores dependen de eso.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

pub type MapFn = fn(&str, &str) -> Vec<KeyValue>;
pub type ReduceFn = fn(&str, &[String]) -> String;

/// FNV-1a de 32 bits con el bit alto apagado, para que `ihash(key) % R`
/// dé la misma partición en cualquier implementación.
pub fn ihash(key: &str) -> u32 {
    let mut h: u32 = 2_166_136_261;
    for b in key.as_bytes() {
        h ^= u32::from(*b);
        h = h.wrapping_mul(16_777_619);
    }
    h & 0x7fff_ffff
}

/// Motor map/reduce sin estado, parametrizado por las dos funciones de
/// usuario. Todas las rutas se resuelven contra `dir` (una ruta absoluta
/// pasa sin cambios).
pub struct MapReduce {
    mapf: MapFn,
    reducef: ReduceFn,
    dir: PathBuf,
}

impl MapReduce {
    pub fn new(mapf: MapFn, reducef: ReduceFn) -> Self {
        MapReduce {
            mapf,
            reducef,
            dir: PathBuf::from("."),
        }
    }

    /// Directorio de datos: entradas relativas, mr-map-* y mr-out-*.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    fn resolve(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Lee el archivo completo, aplica map y parte los pares en R listas
    /// según `ihash(key) % R`.
    pub fn map_and_shuffle(&self, filename: &str, n_reduce: u32) -> io::Result<Vec<Vec<KeyValue>>> {
        let contents = fs::read_to_string(self.resolve(filename))?;
        let pairs = (self.mapf)(filename, &contents);

        if n_reduce == 0 {
            return Ok(Vec::new());
        }
        let mut partitions = vec![Vec::new(); n_reduce as usize];
        for kv in pairs {
            let index = (ihash(&kv.key) % n_reduce) as usize;
            partitions[index].push(kv);
        }
        Ok(partitions)
    }

    /// Anexa cada partición k a "mr-map-{k}" (k arranca en 1), un objeto
    /// JSON por registro. El archivo se abre en modo append-create aunque la
    /// partición venga vacía, para que el lado reduce siempre lo encuentre.
    /// Errores de apertura saltan la partición; errores de codificación
    /// saltan el registro. Todo queda en el log.
    pub fn store_map(&self, partitions: &[Vec<KeyValue>]) {
        for (i, partition) in partitions.iter().enumerate() {
            let path = self.resolve(&format!("mr-map-{}", i + 1));
            let mut file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(f) => f,
                Err(e) => {
                    warn!("no se pudo abrir {}: {e}", path.display());
                    continue;
                }
            };
            for kv in partition {
                // cada registro se anexa en un solo write, así escritores
                // concurrentes acumulan duplicados pero no registros partidos
                let mut record = match serde_json::to_vec(kv) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("error codificando registro en {}: {e}", path.display());
                        continue;
                    }
                };
                record.push(b'\n');
                if let Err(e) = file.write_all(&record) {
                    warn!("error escribiendo {}: {e}", path.display());
                }
            }
        }
    }

    /// Decodifica registros hasta EOF. Un error de decodificación a mitad
    /// del archivo se trata como fin de stream: se devuelve lo acumulado.
    pub fn read_map(&self, src: &str) -> io::Result<Vec<KeyValue>> {
        let file = File::open(self.resolve(src))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        for item in serde_json::Deserializer::from_reader(reader).into_iter::<KeyValue>() {
            match item {
                Ok(kv) => records.push(kv),
                Err(_) => break,
            }
        }
        Ok(records)
    }

    /// Ordena por clave (orden estable), agrupa claves iguales adyacentes y
    /// llama reduce una vez por grupo. La salida sigue el orden de las claves.
    pub fn reduce(&self, mut records: Vec<KeyValue>) -> Vec<KeyValue> {
        records.sort_by(|a, b| a.key.cmp(&b.key));

        let mut output = Vec::with_capacity(records.len());
        let mut i = 0;
        while i < records.len() {
            let mut j = i + 1;
            while j < records.len() && records[j].key == records[i].key {
                j += 1;
            }
            let values: Vec<String> = records[i..j].iter().map(|kv| kv.value.clone()).collect();
            output.push(KeyValue {
                key: records[i].key.clone(),
                value: (self.reducef)(&records[i].key, &values),
            });
            i = j;
        }
        output
    }

    /// Crea (truncando) "mr-out-{k}" y escribe una línea "clave valor" por
    /// registro. Tareas REDUCE reintentadas reescriben el archivo entero.
    pub fn store_reduce(&self, partition: u32, records: &[KeyValue]) -> io::Result<()> {
        let path = self.resolve(&format!("mr-out-{partition}"));
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for kv in records {
            writeln!(writer, "{} {}", kv.key, kv.value)?;
        }
        writer.flush()
    }
}
