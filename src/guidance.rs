//! Narration text for a guided corrective exercise.

use crate::risk::{RiskFactor, RiskKind};

const CONGRATULATIONS: &str =
    "Parabéns, sua postura está excelente! Mantenha os bons hábitos posturais.";
const INTRO: &str = "Com base na sua avaliação postural, vamos começar com um exercício focado nas suas áreas de atenção. ";
const GENERAL_AWARENESS: &str = "Seu principal ponto de atenção é o alinhamento geral. Vamos fazer uma 'postura da montanha' para consciência corporal. Fique em pé, distribua o peso igualmente nos pés, relaxe os ombros, e imagine um fio puxando o topo da sua cabeça para o céu. Mantenha esta postura por um minuto, respirando profundamente.";
const CLOSING: &str = " Lembre-se de respirar profundamente durante todo o exercício. Vamos lá!";

fn exercise_script(kind: RiskKind) -> Option<&'static str> {
    match kind {
        RiskKind::ForwardHead => Some("Para a projeção anterior da cabeça, vamos fazer um exercício de retração cervical. Sente-se ou fique em pé com a coluna reta. Lentamente, deslize o queixo para trás, como se estivesse fazendo um 'queixo duplo', mantendo o olhar para a frente. Segure por cinco segundos e relaxe. Repita dez vezes. Isso ajuda a realinhar a cabeça e fortalecer os músculos profundos do pescoço."),
        RiskKind::ShoulderAsymmetry => Some("Para a assimetria dos ombros, faremos o alongamento do trapézio superior. Incline a cabeça para o lado oposto do ombro mais alto, usando a mão para aplicar uma leve pressão. Você deve sentir o alongamento na lateral do pescoço. Mantenha por vinte segundos em cada lado. Este exercício ajuda a equilibrar a altura dos ombros."),
        RiskKind::PelvicAsymmetry => Some("Para a assimetria pélvica, vamos fortalecer o glúteo médio. Deite-se de lado, com os joelhos dobrados e os pés juntos. Mantenha os pés em contato e levante o joelho superior, como se fosse abrir uma concha. Mantenha o movimento lento e controlado, sem girar o tronco. Faça quinze repetições em cada lado."),
        RiskKind::KneeAxisDeviation => Some("Para o desvio dos joelhos, faremos agachamento isométrico com faixa. Coloque uma faixa elástica logo acima dos joelhos. Agache lentamente até um ângulo de quarenta e cinco graus, empurrando os joelhos contra a faixa para ativar os glúteos. Mantenha a posição por trinta segundos. Este exercício estabiliza os joelhos e melhora o alinhamento."),
        RiskKind::ShoulderImbalance
        | RiskKind::PosturalMisalignment
        | RiskKind::HeadTilt => None,
    }
}

/// Spoken guidance for the primary (first) risk factor.
pub fn exercise_narrative(risk_factors: &[RiskFactor]) -> String {
    let primary = match risk_factors.first() {
        Some(primary) => primary,
        None => return CONGRATULATIONS.to_owned(),
    };

    let mut narrative = String::from(INTRO);
    match exercise_script(primary.kind) {
        Some(script) => {
            narrative.push_str("Seu principal ponto de atenção é: ");
            narrative.push_str(primary.factor);
            narrative.push_str(". O exercício que faremos é: ");
            narrative.push_str(script);
        }
        None => narrative.push_str(GENERAL_AWARENESS),
    }
    narrative.push_str(CLOSING);
    narrative
}
